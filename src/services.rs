//! The directory services the forms talk to. Hosts plug in their own
//! backend; [`memory`] provides the in-process versions used by the console.

use async_trait::async_trait;

use crate::{
    errors::RemoteError,
    models::{CalibrationMode, MapMetadata, User, UserEdit},
};

pub mod memory;

pub type RemoteResult<T> = Result<T, RemoteError>;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> RemoteResult<Vec<User>>;
    async fn find_user(&self, username: &str) -> RemoteResult<Option<User>>;

    async fn edit_user(&self, edit: UserEdit) -> RemoteResult<()>;
    async fn delete_user(&self, username: &str) -> RemoteResult<()>;
}

#[async_trait]
pub trait MapDirectory: Send + Sync {
    async fn list_maps(&self) -> RemoteResult<Vec<MapMetadata>>;
    async fn find_map(&self, id: i64) -> RemoteResult<Option<MapMetadata>>;

    /// Stages new details for a map without persisting them.
    fn edit_map_details(&self, map: MapMetadata);
    /// Persists whatever was staged for `id`.
    async fn submit_edited_map(&self, id: i64) -> RemoteResult<()>;
    async fn remove_map(&self, id: i64) -> RemoteResult<()>;
    /// Hands the map over to the calibration workflow.
    async fn set_calibration(&self, mode: CalibrationMode, id: i64) -> RemoteResult<()>;
}

/// Blocking yes/no question, answered before the caller continues.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}
