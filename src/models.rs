use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::FormError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Csv,
    Export,
    Obvius,
    Viewer,
}

impl UserRole {
    // order matches the role select in the edit form
    pub const ALL: [UserRole; 5] = [
        UserRole::Admin,
        UserRole::Csv,
        UserRole::Export,
        UserRole::Obvius,
        UserRole::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Csv => "csv",
            Self::Export => "export",
            Self::Obvius => "obvius",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();

        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| FormError::UnknownRole(s.to_owned()))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    #[serde(default)]
    pub note: String,
}

// what actually gets sent to the directory when saving a user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserEdit {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub password: String,
    pub note: String,
}

impl From<UserEdit> for User {
    fn from(edit: UserEdit) -> Self {
        Self {
            id: edit.id,
            username: edit.username,
            role: edit.role,
            note: edit.note,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for GpsPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MapMetadata {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
    pub filename: String,
    pub circle_size: f64,
    pub displayable: bool,
    #[serde(default)]
    pub origin: Option<GpsPoint>,
    #[serde(default)]
    pub opposite: Option<GpsPoint>,
}

impl MapMetadata {
    // both reference points are needed to place the image on real coordinates
    pub fn is_calibrated(&self) -> bool {
        self.origin.is_some() && self.opposite.is_some()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMode {
    /// Upload a new image file for the map.
    Initiate,
    /// Pick reference points on the current image.
    Calibrate,
}

impl fmt::Display for CalibrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiate => write!(f, "initiate"),
            Self::Calibrate => write!(f, "calibrate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_parse_case_insensitively() {
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(" viewer ".parse::<UserRole>().unwrap(), UserRole::Viewer);
        assert!(matches!(
            "root".parse::<UserRole>(),
            Err(FormError::UnknownRole(name)) if name == "root"
        ));
    }

    #[test]
    fn calibration_needs_both_points() {
        let point = GpsPoint {
            latitude: 44.97,
            longitude: -93.26,
        };
        let mut map = MapMetadata {
            id: 1,
            name: "Campus".into(),
            note: None,
            filename: "campus.png".into(),
            circle_size: 0.15,
            displayable: true,
            origin: Some(point),
            opposite: None,
        };

        assert!(!map.is_calibrated());

        map.opposite = Some(point);
        assert!(map.is_calibrated());
    }

    #[test]
    fn user_edit_serializes_role_lowercase() {
        let edit = UserEdit {
            id: 7,
            username: "alice".into(),
            role: UserRole::Admin,
            password: String::new(),
            note: "ops".into(),
        };

        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["password"], "");
    }
}
