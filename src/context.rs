use std::{borrow::Cow, fmt, sync::Arc};

use crate::{lang::Language, notifications::Notifier};

/// What every form needs from its surroundings: how to phrase things and
/// where to put toasts.
#[derive(Clone)]
pub struct FormContext {
    pub lang: Language,
    pub notifier: Arc<dyn Notifier>,
}

// Convenience aliases to prevent having to ctx.lang.t
impl FormContext {
    pub fn new(lang: Language, notifier: Arc<dyn Notifier>) -> Self {
        Self { lang, notifier }
    }

    pub fn t<'a>(&self, key: &'a str) -> Cow<'a, str> {
        self.lang.t(key)
    }

    pub fn t1<'a, T: fmt::Display>(&self, key: &'a str, x: T) -> Cow<'a, str> {
        self.lang.t1(key, x)
    }

    pub fn success(&self, text: &str) {
        self.notifier.show_success(text);
    }

    pub fn error(&self, text: &str) {
        self.notifier.show_error(text);
    }
}
