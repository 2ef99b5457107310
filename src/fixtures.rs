use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use figment::{
    Figment,
    providers::{Format, Toml},
};
use log::*;
use serde::Deserialize;

use crate::{
    models::{MapMetadata, User},
    services::memory::{MemoryMapDirectory, MemoryUserDirectory},
};

#[derive(thiserror::Error, Debug)]
pub enum FixturesError {
    #[error("fixtures file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("invalid fixtures file: {0}")]
    Invalid(#[from] Box<figment::Error>),
    #[error("duplicate {kind} id {id} in fixtures")]
    DuplicateId { kind: &'static str, id: i64 },
}

/// Seed content for the in-memory directories.
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub maps: Vec<MapMetadata>,
}

impl Fixtures {
    pub fn load(path: &Path) -> Result<Self, FixturesError> {
        // figment quietly treats a missing file as empty, which would just
        // give an empty console
        if !path.is_file() {
            return Err(FixturesError::Missing(path.to_owned()));
        }

        let fixtures = Figment::from(Toml::file(path))
            .extract::<Self>()
            .map_err(Box::new)?;

        fixtures.check_ids()?;

        debug!(
            "Loaded {} users and {} maps from {}",
            fixtures.users.len(),
            fixtures.maps.len(),
            path.display()
        );

        Ok(fixtures)
    }

    fn check_ids(&self) -> Result<(), FixturesError> {
        fn first_duplicate(mut ids: impl Iterator<Item = i64>) -> Option<i64> {
            let mut seen = HashSet::new();
            ids.find(|id| !seen.insert(*id))
        }

        if let Some(id) = first_duplicate(self.users.iter().map(|u| u.id)) {
            return Err(FixturesError::DuplicateId { kind: "user", id });
        }

        if let Some(id) = first_duplicate(self.maps.iter().map(|m| m.id)) {
            return Err(FixturesError::DuplicateId { kind: "map", id });
        }

        Ok(())
    }

    pub fn into_directories(self) -> (MemoryUserDirectory, MemoryMapDirectory) {
        (
            MemoryUserDirectory::new(self.users),
            MemoryMapDirectory::new(self.maps),
        )
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::models::UserRole;

    #[test]
    fn loads_users_and_maps() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "seed.toml",
                r#"
                [[users]]
                id = 1
                username = "alice"
                role = "admin"

                [[users]]
                id = 2
                username = "bob"
                role = "viewer"
                note = "read only"

                [[maps]]
                id = 10
                name = "Campus"
                filename = "campus.png"
                circle_size = 0.15
                displayable = true
                origin = { latitude = 45.0, longitude = -93.0 }
                opposite = { latitude = 45.1, longitude = -92.9 }
                "#,
            )?;

            let fixtures = Fixtures::load(Path::new("seed.toml")).expect("valid fixtures");

            assert_eq!(fixtures.users.len(), 2);
            assert_eq!(fixtures.users[0].role, UserRole::Admin);
            assert_eq!(fixtures.users[0].note, "");
            assert_eq!(fixtures.users[1].note, "read only");
            assert!(fixtures.maps[0].is_calibrated());
            assert_eq!(fixtures.maps[0].note, None);

            Ok(())
        });
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "seed.toml",
                r#"
                [[users]]
                id = 1
                username = "alice"
                role = "admin"

                [[users]]
                id = 1
                username = "bob"
                role = "csv"
                "#,
            )?;

            let err = Fixtures::load(Path::new("seed.toml")).unwrap_err();
            assert!(matches!(err, FixturesError::DuplicateId { kind: "user", id: 1 }));

            Ok(())
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Fixtures::load(Path::new("/nonexistent/seed.toml")).unwrap_err();
        assert!(matches!(err, FixturesError::Missing(..)));
    }
}
