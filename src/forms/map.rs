use std::{borrow::Cow, str::FromStr, sync::Arc};

use log::*;

use super::{FormLimits, FormMode, Submission};
use crate::{
    context::FormContext,
    errors::{FormError, FormResult},
    models::{CalibrationMode, GpsPoint, MapMetadata},
    services::{Confirm, MapDirectory},
    validation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapField {
    Name,
    Note,
    CircleSize,
    Displayable,
}

impl FromStr for MapField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "note" => Ok(Self::Note),
            "circleSize" | "circle_size" | "circle-size" => Ok(Self::CircleSize),
            "displayable" => Ok(Self::Displayable),
            other => Err(FormError::UnknownField(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapDraft {
    name: String,
    note: String,
    circle_size_text: String,
    displayable: bool,
}

impl MapDraft {
    // the stored note is kept whole; only typed input is truncated
    fn seed(map: &MapMetadata) -> Self {
        Self {
            name: map.name.clone(),
            note: map.note.clone().unwrap_or_default(),
            circle_size_text: map.circle_size.to_string(),
            displayable: map.displayable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn circle_size_text(&self) -> &str {
        &self.circle_size_text
    }

    pub fn displayable(&self) -> bool {
        self.displayable
    }
}

fn parse_flag(value: &str) -> FormResult<bool> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(FormError::InvalidFlag(other.to_owned())),
    }
}

pub struct MapEditForm {
    map: MapMetadata,
    draft: MapDraft,
    // circle size text as of the last successful validation
    accepted_circle_size: String,
    limits: FormLimits,
    mode: FormMode,
    ctx: FormContext,
    directory: Arc<dyn MapDirectory>,
}

impl MapEditForm {
    pub fn new(map: MapMetadata, ctx: FormContext, directory: Arc<dyn MapDirectory>) -> Self {
        Self::with_limits(map, ctx, directory, FormLimits::default())
    }

    pub fn with_limits(
        map: MapMetadata,
        ctx: FormContext,
        directory: Arc<dyn MapDirectory>,
        limits: FormLimits,
    ) -> Self {
        let draft = MapDraft::seed(&map);
        let accepted_circle_size = draft.circle_size_text.clone();

        Self {
            map,
            draft,
            accepted_circle_size,
            limits,
            mode: FormMode::Closed,
            ctx,
            directory,
        }
    }

    pub fn map(&self) -> &MapMetadata {
        &self.map
    }

    pub fn draft(&self) -> &MapDraft {
        &self.draft
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn limits(&self) -> &FormLimits {
        &self.limits
    }

    pub fn filename(&self) -> &str {
        &self.map.filename
    }

    pub fn origin(&self) -> Option<&GpsPoint> {
        self.map.origin.as_ref()
    }

    pub fn opposite(&self) -> Option<&GpsPoint> {
        self.map.opposite.as_ref()
    }

    pub fn calibration_status_key(&self) -> &'static str {
        if self.map.is_calibrated() {
            "map.is.calibrated"
        } else {
            "map.is.not.calibrated"
        }
    }

    pub fn calibration_status(&self) -> Cow<'static, str> {
        self.ctx.t(self.calibration_status_key())
    }

    pub fn open(&mut self) {
        if self.mode == FormMode::Closed {
            self.mode = FormMode::Editing;
        }
    }

    pub fn close(&mut self) {
        self.mode = FormMode::Closed;
        self.reseed();
    }

    fn reseed(&mut self) {
        self.draft = MapDraft::seed(&self.map);
        self.accepted_circle_size = self.draft.circle_size_text.clone();
    }

    pub fn set_name(&mut self, name: &str) -> FormResult<()> {
        self.mode.require(FormMode::Editing)?;
        self.draft.name = name.to_owned();

        Ok(())
    }

    /// Anything past the note limit is dropped on input.
    pub fn set_note(&mut self, note: &str) -> FormResult<()> {
        self.mode.require(FormMode::Editing)?;
        self.draft.note = validation::truncate_note(note, self.limits.note_max_chars);

        Ok(())
    }

    /// Stores the raw text; it is only checked by [`Self::validate_circle_size`].
    pub fn set_circle_size(&mut self, text: &str) -> FormResult<()> {
        self.mode.require(FormMode::Editing)?;
        self.draft.circle_size_text = text.to_owned();

        Ok(())
    }

    pub fn set_displayable(&mut self, displayable: bool) -> FormResult<()> {
        self.mode.require(FormMode::Editing)?;
        self.draft.displayable = displayable;

        Ok(())
    }

    pub fn set_field(&mut self, field: MapField, value: &str) -> FormResult<()> {
        match field {
            MapField::Name => self.set_name(value),
            MapField::Note => self.set_note(value),
            MapField::CircleSize => self.set_circle_size(value),
            MapField::Displayable => self.set_displayable(parse_flag(value)?),
        }
    }

    pub fn set_field_by_name(&mut self, name: &str, value: &str) -> FormResult<()> {
        self.set_field(name.parse()?, value)
    }

    /// Inline marker on the circle size input; only text starting with a
    /// negative number is flagged while typing.
    pub fn circle_size_flagged(&self) -> bool {
        validation::leading_number(&self.draft.circle_size_text).is_some_and(|v| v < 0.0)
    }

    /// Runs when the circle size input loses focus. Rejected text is reported
    /// and replaced with the last accepted value.
    pub fn validate_circle_size(&mut self) -> FormResult<f64> {
        match validation::parse_circle_size(
            &self.draft.circle_size_text,
            self.limits.circle_size_max,
        ) {
            Ok(value) => {
                self.accepted_circle_size = self.draft.circle_size_text.clone();
                Ok(value)
            }
            Err(err) => {
                debug!(
                    "Rejected circle size {:?} for map {}, restoring {:?}",
                    self.draft.circle_size_text, self.map.id, self.accepted_circle_size
                );

                self.ctx.error(&self.ctx.t("invalid.number"));
                self.draft.circle_size_text = self.accepted_circle_size.clone();

                Err(err)
            }
        }
    }

    fn updated_map(&self) -> FormResult<MapMetadata> {
        let circle_size = validation::parse_circle_size(
            &self.draft.circle_size_text,
            self.limits.circle_size_max,
        )?;

        let note = (!self.draft.note.is_empty()).then(|| self.draft.note.clone());

        Ok(MapMetadata {
            name: self.draft.name.clone(),
            note,
            circle_size,
            displayable: self.draft.displayable,
            ..self.map.clone()
        })
    }

    pub async fn save(&mut self) -> FormResult<Submission> {
        self.mode.require(FormMode::Editing)?;

        let updated = match self.updated_map() {
            Ok(updated) => updated,
            Err(err) => {
                self.ctx.error(&self.ctx.t(err.i18n_key()));
                return Err(err);
            }
        };

        let id = updated.id;
        info!(
            "Submitting edits for map {id}: name={:?}, circle_size={}, displayable={}",
            updated.name, updated.circle_size, updated.displayable
        );
        debug!(
            "Map {id} payload: {}",
            serde_json::to_string(&updated).unwrap_or_default()
        );

        self.directory.edit_map_details(updated.clone());
        let result = self.directory.submit_edited_map(id).await;

        self.mode = FormMode::Closed;

        // no toast on this path either way, only the log
        match result {
            Ok(()) => {
                info!("Map {id} saved");
                self.map = updated;
                self.reseed();

                Ok(Submission::Accepted)
            }
            Err(err) => {
                warn!("Saving map {id} failed: {err}");

                Ok(Submission::Rejected(err.message))
            }
        }
    }

    pub fn delete_prompt(&self) -> String {
        self.ctx.t1("map.confirm.remove", &self.map.name).into_owned()
    }

    /// Asks `confirm` first; the map is only removed on consent.
    pub async fn delete(&mut self, confirm: &dyn Confirm) -> FormResult<Submission> {
        self.mode.require(FormMode::Editing)?;

        if !confirm.confirm(&self.delete_prompt()) {
            debug!("Removal of map {} declined", self.map.id);
            return Ok(Submission::Declined);
        }

        let id = self.map.id;
        info!("Removing map {id} ({})", self.map.name);

        let result = self.directory.remove_map(id).await;
        self.mode = FormMode::Closed;

        match result {
            Ok(()) => Ok(Submission::Accepted),
            Err(err) => {
                warn!("Removing map {id} failed: {err}");
                Ok(Submission::Rejected(err.message))
            }
        }
    }

    /// Hands the map to the upload (`Initiate`) or calibration workflow and
    /// gets out of the way; progress is tracked elsewhere.
    pub async fn start_calibration(&mut self, mode: CalibrationMode) -> FormResult<Submission> {
        self.mode.require(FormMode::Editing)?;

        let id = self.map.id;
        info!("Starting {mode} for map {id}");

        let result = self.directory.set_calibration(mode, id).await;
        self.mode = FormMode::Closed;

        match result {
            Ok(()) => Ok(Submission::Accepted),
            Err(err) => {
                warn!("Could not start {mode} for map {id}: {err}");
                Ok(Submission::Rejected(err.message))
            }
        }
    }
}
