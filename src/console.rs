//! Line-oriented operator console. One command per line; notifications
//! raised by a command are printed right after its own output.

use std::{
    cell::RefCell,
    io::{self, BufRead, Write},
    str::FromStr,
    sync::Arc,
};

use log::*;

use crate::{
    context::FormContext,
    errors::{FormError, RemoteError},
    forms::{
        FormLimits, FormMode, Submission,
        map::MapEditForm,
        user::UserEditForm,
    },
    lang::Language,
    models::CalibrationMode,
    notifications::NotificationLog,
    services::{Confirm, MapDirectory, UserDirectory},
    session::{IdentityProvider, SessionStore},
};

const HELP: &str = "\
commands:
  users | maps                 list directory contents
  login <username> | logout    change who the console acts as
  edit-user <username>         open the user edit form
  edit-map <id>                open the map edit form
  set <field> <value>          change a field of the open form
  blur                         check the circle size (map form)
  show                         print the open form
  save                         save the open form
  delete                       delete the user/map being edited
  confirm | cancel             answer the user delete prompt
  open | close                 reopen (keeping edits) or close the form
  upload | calibrate           start a map file upload or calibration
  quit";

#[derive(thiserror::Error, Debug)]
pub enum ConsoleError {
    #[error("unknown command: {0} (try `help`)")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("not a map id: {0}")]
    InvalidMapId(String),
    #[error("no user named {0}")]
    NoSuchUser(String),
    #[error("no map with id {0}")]
    NoSuchMap(i64),
    #[error("no form is open (use edit-user or edit-map)")]
    NoActiveForm,
    #[error("`{0}` does not apply to this form")]
    NotForThisForm(&'static str),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("directory error: {0}")]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Users,
    Maps,
    Login(String),
    Logout,
    EditUser(String),
    EditMap(i64),
    Set { field: String, value: String },
    Blur,
    Show,
    Save,
    Delete,
    Confirm,
    Cancel,
    Open,
    Close,
    Upload,
    Calibrate,
    Quit,
}

impl FromStr for Command {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let argument = |usage: &'static str| {
            if rest.is_empty() {
                Err(ConsoleError::Usage(usage))
            } else {
                Ok(rest.to_owned())
            }
        };

        let command = match word {
            "help" | "?" => Self::Help,
            "users" => Self::Users,
            "maps" => Self::Maps,
            "login" => Self::Login(argument("login <username>")?),
            "logout" => Self::Logout,
            "edit-user" => Self::EditUser(argument("edit-user <username>")?),
            "edit-map" => {
                let id = argument("edit-map <id>")?;
                Self::EditMap(id.parse::<i64>().map_err(|_| ConsoleError::InvalidMapId(id))?)
            }
            "set" => {
                // values may contain spaces (notes, names); fields never do
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .unwrap_or((rest, ""));

                if field.is_empty() {
                    return Err(ConsoleError::Usage("set <field> <value>"));
                }

                Self::Set {
                    field: field.to_owned(),
                    value: value.to_owned(),
                }
            }
            "blur" => Self::Blur,
            "show" => Self::Show,
            "save" => Self::Save,
            "delete" => Self::Delete,
            "confirm" => Self::Confirm,
            "cancel" => Self::Cancel,
            "open" => Self::Open,
            "close" => Self::Close,
            "upload" => Self::Upload,
            "calibrate" => Self::Calibrate,
            "quit" | "exit" => Self::Quit,
            other => return Err(ConsoleError::UnknownCommand(other.to_owned())),
        };

        Ok(command)
    }
}

/// Everything the console shares with the forms it opens.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserDirectory>,
    pub maps: Arc<dyn MapDirectory>,
    pub identity: Arc<SessionStore>,
    pub notifications: Arc<NotificationLog>,
}

enum ActiveForm {
    User(UserEditForm),
    Map(MapEditForm),
}

pub struct Console {
    services: Services,
    lang: Language,
    limits: FormLimits,
    active: Option<ActiveForm>,
}

impl Console {
    pub fn new(services: Services, lang: Language, limits: FormLimits) -> Self {
        Self {
            services,
            lang,
            limits,
            active: None,
        }
    }

    fn form_context(&self) -> FormContext {
        FormContext::new(self.lang, self.services.notifications.clone())
    }

    pub fn describe(&self, err: &ConsoleError) -> String {
        match err {
            ConsoleError::Form(inner) => {
                format!("{} ({inner})", self.lang.t(inner.i18n_key()))
            }
            other => other.to_string(),
        }
    }

    pub async fn run<R: BufRead, W: Write>(&mut self, input: R, output: W) -> io::Result<()> {
        let lines = RefCell::new(input.lines());
        let output = RefCell::new(output);

        writeln!(output.borrow_mut(), "atlas-admin console; type `help` for commands")?;

        loop {
            {
                let mut out = output.borrow_mut();
                write!(out, "> ")?;
                out.flush()?;
            }

            let Some(line) = lines.borrow_mut().next() else {
                break;
            };
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            let replies = match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    let prompt = LinePrompt {
                        lines: &lines,
                        output: &output,
                    };

                    match self.execute(command, &prompt).await {
                        Ok(replies) => replies,
                        Err(err) => vec![self.describe(&err)],
                    }
                }
                Err(err) => vec![self.describe(&err)],
            };

            let mut out = output.borrow_mut();
            for reply in replies {
                writeln!(out, "{reply}")?;
            }
            for notification in self.services.notifications.drain() {
                writeln!(out, "{notification}")?;
            }
        }

        Ok(())
    }

    pub async fn execute(
        &mut self,
        command: Command,
        confirm: &dyn Confirm,
    ) -> Result<Vec<String>, ConsoleError> {
        debug!("Executing {command:?}");

        match command {
            Command::Help => Ok(HELP.lines().map(str::to_owned).collect()),
            Command::Users => self.list_users().await,
            Command::Maps => self.list_maps().await,
            Command::Login(username) => {
                self.services.identity.login(&username);
                self.sync_identity();
                Ok(vec![format!("logged in as {username}")])
            }
            Command::Logout => {
                self.services.identity.logout();
                self.sync_identity();
                Ok(vec!["logged out".to_owned()])
            }
            Command::EditUser(username) => {
                let user = self
                    .services
                    .users
                    .find_user(&username)
                    .await?
                    .ok_or_else(|| ConsoleError::NoSuchUser(username.clone()))?;

                let mut form =
                    UserEditForm::new(user, self.form_context(), self.services.users.clone());
                form.sync_identity(self.services.identity.as_ref());
                form.open();

                self.active = Some(ActiveForm::User(form));
                self.show()
            }
            Command::EditMap(id) => {
                let map = self
                    .services
                    .maps
                    .find_map(id)
                    .await?
                    .ok_or(ConsoleError::NoSuchMap(id))?;

                let mut form = MapEditForm::with_limits(
                    map,
                    self.form_context(),
                    self.services.maps.clone(),
                    self.limits,
                );
                form.open();

                self.active = Some(ActiveForm::Map(form));
                self.show()
            }
            Command::Set { field, value } => {
                match self.active_mut()? {
                    ActiveForm::User(form) => form.set_field_by_name(&field, &value)?,
                    ActiveForm::Map(form) => form.set_field_by_name(&field, &value)?,
                }
                self.show()
            }
            Command::Blur => match self.active_mut()? {
                ActiveForm::Map(form) => {
                    // rejection is reported through the notification
                    match form.validate_circle_size() {
                        Ok(value) => Ok(vec![format!("circle size {value} accepted")]),
                        Err(FormError::InvalidCircleSize(_)) => Ok(vec![]),
                        Err(err) => Err(err.into()),
                    }
                }
                ActiveForm::User(_) => Err(ConsoleError::NotForThisForm("blur")),
            },
            Command::Show => self.show(),
            Command::Save => match self.active_mut()? {
                ActiveForm::User(form) => {
                    form.save().await?;
                    Ok(vec![])
                }
                ActiveForm::Map(form) => Ok(vec![outcome(&form.save().await?)]),
            },
            Command::Delete => match self.active_mut()? {
                ActiveForm::User(form) => {
                    form.request_delete()?;
                    let prompt = form.delete_prompt();
                    Ok(vec![
                        prompt.message,
                        format!(
                            "  confirm: {} | cancel: {}",
                            prompt.confirm_text, prompt.reject_text
                        ),
                    ])
                }
                ActiveForm::Map(form) => Ok(vec![outcome(&form.delete(confirm).await?)]),
            },
            Command::Confirm => match self.active_mut()? {
                ActiveForm::User(form) => {
                    form.confirm_delete().await?;
                    Ok(vec![])
                }
                ActiveForm::Map(_) => Err(ConsoleError::NotForThisForm("confirm")),
            },
            Command::Cancel => match self.active_mut()? {
                ActiveForm::User(form) if form.mode() == FormMode::ConfirmingDelete => {
                    form.cancel_delete()?;
                    self.show()
                }
                ActiveForm::User(form) => {
                    form.close();
                    Ok(vec![])
                }
                ActiveForm::Map(form) => {
                    form.close();
                    Ok(vec![])
                }
            },
            Command::Open => {
                match self.active_mut()? {
                    ActiveForm::User(form) => form.open(),
                    ActiveForm::Map(form) => form.open(),
                }
                self.show()
            }
            Command::Close => {
                match self.active_mut()? {
                    ActiveForm::User(form) => form.close(),
                    ActiveForm::Map(form) => form.close(),
                }
                Ok(vec![])
            }
            Command::Upload => self.start_calibration(CalibrationMode::Initiate).await,
            Command::Calibrate => self.start_calibration(CalibrationMode::Calibrate).await,
            // the run loop stops before getting here
            Command::Quit => Ok(vec![]),
        }
    }

    fn active_mut(&mut self) -> Result<&mut ActiveForm, ConsoleError> {
        self.active.as_mut().ok_or(ConsoleError::NoActiveForm)
    }

    fn sync_identity(&mut self) {
        let identity = self.services.identity.clone();

        if let Some(ActiveForm::User(form)) = &mut self.active {
            form.sync_identity(identity.as_ref());
        }
    }

    async fn start_calibration(&mut self, mode: CalibrationMode) -> Result<Vec<String>, ConsoleError> {
        match self.active_mut()? {
            ActiveForm::Map(form) => Ok(vec![outcome(&form.start_calibration(mode).await?)]),
            ActiveForm::User(_) => Err(ConsoleError::NotForThisForm(match mode {
                CalibrationMode::Initiate => "upload",
                CalibrationMode::Calibrate => "calibrate",
            })),
        }
    }

    async fn list_users(&self) -> Result<Vec<String>, ConsoleError> {
        let me = self.services.identity.current_user();

        Ok(self
            .services
            .users
            .list_users()
            .await?
            .into_iter()
            .map(|user| {
                let marker = match &me {
                    Some(me) if me.username() == user.username => " *",
                    _ => "",
                };
                format!("{:>4}  {:<16} {}{marker}", user.id, user.username, user.role)
            })
            .collect())
    }

    async fn list_maps(&self) -> Result<Vec<String>, ConsoleError> {
        Ok(self
            .services
            .maps
            .list_maps()
            .await?
            .into_iter()
            .map(|map| {
                let displayable = if map.displayable {
                    "map.is.displayable"
                } else {
                    "map.is.not.displayable"
                };
                let calibrated = if map.is_calibrated() {
                    "map.is.calibrated"
                } else {
                    "map.is.not.calibrated"
                };

                format!(
                    "{:>4}  {:<20} {}, {}",
                    map.id,
                    map.name,
                    self.lang.t(displayable),
                    self.lang.t(calibrated)
                )
            })
            .collect())
    }

    fn show(&self) -> Result<Vec<String>, ConsoleError> {
        let t = |key| self.lang.t(key);

        match self.active.as_ref().ok_or(ConsoleError::NoActiveForm)? {
            ActiveForm::User(form) => {
                let draft = form.draft();
                let mut lines = vec![
                    format!("{} [{}]", t("edit.user"), form.mode()),
                    format!("  {}: {}", t("username"), draft.username),
                    format!("  {}: {}", t("role"), draft.role),
                    format!("  {}: {}", t("password"), "*".repeat(draft.password.chars().count())),
                    format!(
                        "  {}: {}",
                        t("password.confirm"),
                        "*".repeat(draft.confirm_password.chars().count())
                    ),
                    format!("  {}: {}", t("note"), draft.note),
                ];

                if !draft.passwords_match() {
                    lines.push(format!("  ! {}", t("user.password.mismatch")));
                }
                if let Some(notice) = form.self_delete_notice() {
                    lines.push(format!("  ! {notice}"));
                }

                Ok(lines)
            }
            ActiveForm::Map(form) => {
                let draft = form.draft();
                let displayable = if draft.displayable() {
                    "map.is.displayable"
                } else {
                    "map.is.not.displayable"
                };
                let flagged = if form.circle_size_flagged() { " (!)" } else { "" };

                Ok(vec![
                    format!("{} [{}]", t("edit.map"), form.mode()),
                    format!("  {}: {}", t("map.name"), draft.name()),
                    format!("  {}: {}", t("map.displayable"), t(displayable)),
                    format!(
                        "  {}: {}{flagged}",
                        t("map.circle.size"),
                        draft.circle_size_text()
                    ),
                    format!("  {}: {}", t("note"), draft.note()),
                    format!("  {}: {}", t("map.filename"), form.filename()),
                    format!("  {}: {}", t("map.calibration"), form.calibration_status()),
                ])
            }
        }
    }
}

fn outcome(submission: &Submission) -> String {
    match submission {
        Submission::Accepted => "done".to_owned(),
        Submission::Rejected(message) => format!("failed: {message}"),
        Submission::Declined => "nothing changed".to_owned(),
    }
}

// asks on the console's own input, so scripted sessions can answer too
struct LinePrompt<'a, R, W> {
    lines: &'a RefCell<io::Lines<R>>,
    output: &'a RefCell<W>,
}

impl<R: BufRead, W: Write> Confirm for LinePrompt<'_, R, W> {
    fn confirm(&self, message: &str) -> bool {
        {
            let mut out = self.output.borrow_mut();
            if let Err(err) = write!(out, "{message} [y/N] ").and_then(|_| out.flush()) {
                warn!("Could not show confirmation prompt: {err}");
                return false;
            }
        }

        match self.lines.borrow_mut().next() {
            Some(Ok(answer)) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Some(Err(err)) => {
                warn!("Could not read confirmation answer: {err}");
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!("users".parse::<Command>().unwrap(), Command::Users);
        assert_eq!(
            "  edit-user   alice ".parse::<Command>().unwrap(),
            Command::EditUser("alice".into())
        );
        assert_eq!("edit-map 12".parse::<Command>().unwrap(), Command::EditMap(12));
        assert_eq!(
            "set note back after the  holidays".parse::<Command>().unwrap(),
            Command::Set {
                field: "note".into(),
                value: "back after the  holidays".into(),
            }
        );
        assert_eq!(
            "set password".parse::<Command>().unwrap(),
            Command::Set {
                field: "password".into(),
                value: String::new(),
            }
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(matches!(
            "edit-map twelve".parse::<Command>(),
            Err(ConsoleError::InvalidMapId(id)) if id == "twelve"
        ));
        assert!(matches!(
            "login".parse::<Command>(),
            Err(ConsoleError::Usage("login <username>"))
        ));
        assert!(matches!("set".parse::<Command>(), Err(ConsoleError::Usage(_))));
        assert!(matches!(
            "frobnicate".parse::<Command>(),
            Err(ConsoleError::UnknownCommand(_))
        ));
    }
}
