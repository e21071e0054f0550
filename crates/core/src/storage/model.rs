use crate::error::AdvisorError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A JSON document persisted through the model store.
///
/// Required fields and types are enforced by the `serde` shape; `validate`
/// adds the constraints the shape cannot express (minimum lengths, ordering).
pub trait StoredModel: Serialize + DeserializeOwned {
    const MODEL_NAME: &'static str;

    /// Folder under which objects of this model live, both in the remote
    /// bucket and in the local seed directory.
    const FOLDER_PREFIX: &'static str;

    fn validate(&self) -> Result<(), AdvisorError>;

    fn object_key(object_name: &str) -> String {
        format!("{}/{}", Self::FOLDER_PREFIX, object_name)
    }
}

pub fn decode_model<M: StoredModel>(bytes: &[u8]) -> Result<M, AdvisorError> {
    let model = serde_json::from_slice::<M>(bytes).map_err(|e| {
        AdvisorError::validation(format!("{} does not match its schema: {e}", M::MODEL_NAME))
    })?;
    model.validate()?;
    Ok(model)
}

pub fn encode_model<M: StoredModel>(model: &M) -> Result<Vec<u8>, AdvisorError> {
    model.validate()?;
    serde_json::to_vec_pretty(model).map_err(|e| {
        AdvisorError::validation(format!("{} could not be serialized: {e}", M::MODEL_NAME))
    })
}
