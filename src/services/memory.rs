//! In-memory directories for development and testing

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use log::*;

use super::{MapDirectory, RemoteResult, UserDirectory};
use crate::{
    errors::RemoteError,
    models::{CalibrationMode, MapMetadata, User, UserEdit},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// one-shot injected failure, consumed by the next mutating call
fn take_failure(slot: &Mutex<Option<String>>) -> RemoteResult<()> {
    match lock(slot).take() {
        Some(message) => Err(RemoteError::new(message)),
        None => Ok(()),
    }
}

#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<BTreeMap<i64, User>>,
    fail_next: Mutex<Option<String>>,
}

impl MemoryUserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        let directory = Self::default();
        lock(&directory.users).extend(users.into_iter().map(|u| (u.id, u)));
        directory
    }

    /// Makes the next edit or delete fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *lock(&self.fail_next) = Some(message.into());
    }

    pub fn get(&self, id: i64) -> Option<User> {
        lock(&self.users).get(&id).cloned()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn list_users(&self) -> RemoteResult<Vec<User>> {
        Ok(lock(&self.users).values().cloned().collect())
    }

    async fn find_user(&self, username: &str) -> RemoteResult<Option<User>> {
        Ok(lock(&self.users)
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn edit_user(&self, edit: UserEdit) -> RemoteResult<()> {
        take_failure(&self.fail_next)?;

        let mut users = lock(&self.users);

        if !users.contains_key(&edit.id) {
            return Err(RemoteError::new(format!("no user with id {}", edit.id)));
        }

        // usernames are the delete key, so they must stay unique
        if users
            .values()
            .any(|u| u.id != edit.id && u.username == edit.username)
        {
            return Err(RemoteError::new(format!(
                "username {} is already taken",
                edit.username
            )));
        }

        if !edit.password.is_empty() {
            debug!("Password changed for user {}", edit.id);
        }

        users.insert(edit.id, edit.into());

        Ok(())
    }

    async fn delete_user(&self, username: &str) -> RemoteResult<()> {
        take_failure(&self.fail_next)?;

        let mut users = lock(&self.users);
        let before = users.len();
        users.retain(|_, u| u.username != username);

        if users.len() == before {
            Err(RemoteError::new(format!("no user named {username}")))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct MemoryMapDirectory {
    maps: Mutex<BTreeMap<i64, MapMetadata>>,
    staged: Mutex<BTreeMap<i64, MapMetadata>>,
    calibration: Mutex<Option<(CalibrationMode, i64)>>,
    fail_next: Mutex<Option<String>>,
}

impl MemoryMapDirectory {
    pub fn new(maps: impl IntoIterator<Item = MapMetadata>) -> Self {
        let directory = Self::default();
        lock(&directory.maps).extend(maps.into_iter().map(|m| (m.id, m)));
        directory
    }

    /// Makes the next submit, remove or calibration request fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *lock(&self.fail_next) = Some(message.into());
    }

    pub fn get(&self, id: i64) -> Option<MapMetadata> {
        lock(&self.maps).get(&id).cloned()
    }

    pub fn staged(&self, id: i64) -> Option<MapMetadata> {
        lock(&self.staged).get(&id).cloned()
    }

    /// The map currently handed to the calibration workflow, if any.
    pub fn calibration(&self) -> Option<(CalibrationMode, i64)> {
        *lock(&self.calibration)
    }
}

#[async_trait]
impl MapDirectory for MemoryMapDirectory {
    async fn list_maps(&self) -> RemoteResult<Vec<MapMetadata>> {
        Ok(lock(&self.maps).values().cloned().collect())
    }

    async fn find_map(&self, id: i64) -> RemoteResult<Option<MapMetadata>> {
        Ok(self.get(id))
    }

    fn edit_map_details(&self, map: MapMetadata) {
        lock(&self.staged).insert(map.id, map);
    }

    async fn submit_edited_map(&self, id: i64) -> RemoteResult<()> {
        take_failure(&self.fail_next)?;

        let staged = lock(&self.staged)
            .remove(&id)
            .ok_or_else(|| RemoteError::new(format!("no pending edits for map {id}")))?;

        let mut maps = lock(&self.maps);
        if !maps.contains_key(&id) {
            return Err(RemoteError::new(format!("no map with id {id}")));
        }

        maps.insert(id, staged);

        Ok(())
    }

    async fn remove_map(&self, id: i64) -> RemoteResult<()> {
        take_failure(&self.fail_next)?;

        lock(&self.staged).remove(&id);
        lock(&self.maps)
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::new(format!("no map with id {id}")))
    }

    async fn set_calibration(&self, mode: CalibrationMode, id: i64) -> RemoteResult<()> {
        take_failure(&self.fail_next)?;

        if !lock(&self.maps).contains_key(&id) {
            return Err(RemoteError::new(format!("no map with id {id}")));
        }

        *lock(&self.calibration) = Some((mode, id));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.into(),
            role: UserRole::Viewer,
            note: String::new(),
        }
    }

    fn map(id: i64) -> MapMetadata {
        MapMetadata {
            id,
            name: format!("map {id}"),
            note: None,
            filename: format!("map{id}.png"),
            circle_size: 0.15,
            displayable: false,
            origin: None,
            opposite: None,
        }
    }

    #[tokio::test]
    async fn edit_rejects_duplicate_usernames() {
        let directory = MemoryUserDirectory::new([user(1, "alice"), user(2, "bob")]);

        let edit = UserEdit {
            id: 2,
            username: "alice".into(),
            role: UserRole::Admin,
            password: String::new(),
            note: String::new(),
        };

        let err = directory.edit_user(edit).await.unwrap_err();
        assert_eq!(err.message, "username alice is already taken");
        assert_eq!(directory.get(2).unwrap().username, "bob");
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let directory = MemoryUserDirectory::new([user(1, "alice"), user(2, "bob")]);
        directory.fail_next("backend down");

        assert_eq!(
            directory.delete_user("bob").await,
            Err(RemoteError::new("backend down"))
        );
        assert!(directory.delete_user("bob").await.is_ok());
        assert!(directory.find_user("bob").await.unwrap().is_none());
        assert!(directory.delete_user("bob").await.is_err());
    }

    #[tokio::test]
    async fn staged_map_edits_persist_only_on_submit() {
        let directory = MemoryMapDirectory::new([map(3)]);

        let mut edited = map(3);
        edited.name = "Library".into();
        directory.edit_map_details(edited.clone());

        assert_eq!(directory.get(3).unwrap().name, "map 3");
        assert_eq!(directory.staged(3), Some(edited.clone()));

        directory.submit_edited_map(3).await.unwrap();
        assert_eq!(directory.get(3), Some(edited));
        assert!(directory.staged(3).is_none());
        assert!(directory.submit_edited_map(3).await.is_err());
    }

    #[tokio::test]
    async fn calibration_requires_existing_map() {
        let directory = MemoryMapDirectory::new([map(3)]);

        assert!(directory.set_calibration(CalibrationMode::Calibrate, 9).await.is_err());
        directory
            .set_calibration(CalibrationMode::Initiate, 3)
            .await
            .unwrap();
        assert_eq!(directory.calibration(), Some((CalibrationMode::Initiate, 3)));

        directory.remove_map(3).await.unwrap();
        assert!(directory.list_maps().await.unwrap().is_empty());
    }
}
