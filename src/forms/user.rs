use std::{borrow::Cow, str::FromStr, sync::Arc};

use log::*;

use super::{FormMode, Submission};
use crate::{
    context::FormContext,
    errors::{FormError, FormResult},
    models::{User, UserEdit, UserRole},
    services::UserDirectory,
    session::{CurrentUser, IdentityProvider},
    validation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Username,
    Role,
    Password,
    ConfirmPassword,
    Note,
}

impl FromStr for UserField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" => Ok(Self::Username),
            "role" => Ok(Self::Role),
            "password" => Ok(Self::Password),
            "confirmPassword" | "confirm_password" | "confirm-password" => {
                Ok(Self::ConfirmPassword)
            }
            "note" => Ok(Self::Note),
            other => Err(FormError::UnknownField(other.to_owned())),
        }
    }
}

/// Unsaved copy of a user. The two flags are derived and only ever written
/// by [`UserEditForm`] right after the fields they depend on change.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub password: String,
    pub confirm_password: String,
    pub note: String,
    passwords_match: bool,
    delete_disabled: bool,
}

impl UserDraft {
    fn seed(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            password: String::new(),
            confirm_password: String::new(),
            note: user.note.clone(),
            passwords_match: true,
            delete_disabled: false,
        }
    }

    pub fn passwords_match(&self) -> bool {
        self.passwords_match
    }

    pub fn delete_disabled(&self) -> bool {
        self.delete_disabled
    }

    fn to_edit(&self) -> UserEdit {
        UserEdit {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            password: self.password.clone(),
            note: self.note.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub message: String,
    pub confirm_text: String,
    pub reject_text: String,
}

pub struct UserEditForm {
    target: User,
    draft: UserDraft,
    current_user: Option<CurrentUser>,
    mode: FormMode,
    ctx: FormContext,
    directory: Arc<dyn UserDirectory>,
}

impl UserEditForm {
    pub fn new(target: User, ctx: FormContext, directory: Arc<dyn UserDirectory>) -> Self {
        let draft = UserDraft::seed(&target);

        let mut form = Self {
            target,
            draft,
            current_user: None,
            mode: FormMode::Closed,
            ctx,
            directory,
        };
        form.recompute();
        form
    }

    pub fn target(&self) -> &User {
        &self.target
    }

    pub fn draft(&self) -> &UserDraft {
        &self.draft
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.current_user.as_ref()
    }

    pub fn can_save(&self) -> bool {
        self.draft.passwords_match
    }

    pub fn can_delete(&self) -> bool {
        !self.draft.delete_disabled
    }

    pub fn open(&mut self) {
        if self.mode == FormMode::Closed {
            self.mode = FormMode::Editing;
        }
    }

    /// Cancel: hides the form and throws the draft away.
    pub fn close(&mut self) {
        self.mode = FormMode::Closed;
        self.draft = UserDraft::seed(&self.target);
        self.recompute();
    }

    pub fn set_current_user(&mut self, user: Option<CurrentUser>) {
        self.current_user = user;
        self.recompute();
    }

    pub fn sync_identity(&mut self, identity: &dyn IdentityProvider) {
        self.set_current_user(identity.current_user());
    }

    /// Points the form at a different (or refreshed) user. The draft is
    /// re-seeded from it.
    pub fn set_target(&mut self, target: User) {
        self.draft = UserDraft::seed(&target);
        self.target = target;
        self.recompute();
    }

    pub fn set_field(&mut self, field: UserField, value: &str) -> FormResult<()> {
        self.mode.require(FormMode::Editing)?;

        match field {
            UserField::Username => self.draft.username = value.to_owned(),
            UserField::Role => self.draft.role = value.parse()?,
            UserField::Password => self.draft.password = value.to_owned(),
            UserField::ConfirmPassword => self.draft.confirm_password = value.to_owned(),
            UserField::Note => self.draft.note = value.to_owned(),
        }

        self.recompute();

        Ok(())
    }

    pub fn set_field_by_name(&mut self, name: &str, value: &str) -> FormResult<()> {
        self.set_field(name.parse()?, value)
    }

    fn recompute(&mut self) {
        let current = self.current_user.as_ref();

        self.draft.passwords_match =
            validation::passwords_match(&self.draft.password, &self.draft.confirm_password);

        // guard both the account being edited and whatever the draft now
        // calls itself
        self.draft.delete_disabled = validation::is_self(&self.target.username, current)
            || validation::is_self(&self.draft.username, current);
    }

    /// Footer hint shown next to the disabled delete button.
    pub fn self_delete_notice(&self) -> Option<Cow<'static, str>> {
        self.draft
            .delete_disabled
            .then(|| self.ctx.t("delete.self"))
    }

    pub async fn save(&mut self) -> FormResult<Submission> {
        self.mode.require(FormMode::Editing)?;

        if !self.draft.passwords_match {
            debug!("Not saving user {}: passwords differ", self.target.username);
            return Err(FormError::PasswordMismatch);
        }

        // optimistic: the form goes away before the directory answers
        self.mode = FormMode::Closed;

        let edit = self.draft.to_edit();
        info!(
            "Submitting edits for user {} (id {}): role={}, note={:?}, password changed={}",
            self.target.username,
            edit.id,
            edit.role,
            edit.note,
            !edit.password.is_empty()
        );

        let submission = match self.directory.edit_user(edit.clone()).await {
            Ok(()) => {
                let text = self
                    .ctx
                    .t1("users.successfully.edit.user", &self.target.username);
                self.ctx.success(&text);

                self.target = edit.into();

                Submission::Accepted
            }
            Err(err) => {
                warn!("Editing user {} failed: {err}", self.target.username);

                let text = format!(
                    "{} {}",
                    self.ctx
                        .t1("users.failed.to.edit.user", &self.target.username),
                    err.message
                );
                self.ctx.error(&text);

                Submission::Rejected(err.message)
            }
        };

        self.reset_password_fields();

        Ok(submission)
    }

    fn reset_password_fields(&mut self) {
        self.draft.password.clear();
        self.draft.confirm_password.clear();
        self.recompute();
    }

    pub fn delete_prompt(&self) -> DeletePrompt {
        DeletePrompt {
            message: self
                .ctx
                .t1("user.delete.confirm", &self.target.username)
                .into_owned(),
            confirm_text: self.ctx.t("delete.user").into_owned(),
            reject_text: self.ctx.t("cancel").into_owned(),
        }
    }

    /// Swaps the edit form for the confirmation prompt.
    pub fn request_delete(&mut self) -> FormResult<()> {
        self.mode.require(FormMode::Editing)?;

        if self.draft.delete_disabled {
            return Err(FormError::SelfPreservation);
        }

        self.mode = FormMode::ConfirmingDelete;

        Ok(())
    }

    /// Swaps the confirmation prompt back for the edit form, draft intact.
    pub fn cancel_delete(&mut self) -> FormResult<()> {
        self.mode.require(FormMode::ConfirmingDelete)?;
        self.mode = FormMode::Editing;

        Ok(())
    }

    pub async fn confirm_delete(&mut self) -> FormResult<Submission> {
        self.mode.require(FormMode::ConfirmingDelete)?;

        // the session may have changed while the prompt was up
        if self.draft.delete_disabled {
            self.mode = FormMode::Editing;
            return Err(FormError::SelfPreservation);
        }

        // closing the prompt does not bring the edit form back
        self.mode = FormMode::Closed;

        let username = self.target.username.clone();
        info!("Deleting user {username}");

        match self.directory.delete_user(&username).await {
            Ok(()) => {
                let text = self.ctx.t1("users.successfully.delete.user", &username);
                self.ctx.success(&text);

                Ok(Submission::Accepted)
            }
            Err(err) => {
                warn!("Deleting user {username} failed: {err}");

                let text = format!(
                    "{} {}",
                    self.ctx.t1("users.failed.to.delete.user", &username),
                    err.message
                );
                self.ctx.error(&text);

                Ok(Submission::Rejected(err.message))
            }
        }
    }
}
