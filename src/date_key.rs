use chrono::NaiveDate;

/// Turns a calendar date into the string key used on the chart's x-axis.
///
/// Keys are only ever compared for equality; ordering always goes through
/// the [`NaiveDate`] kept next to the key.
pub trait DateKeyFormatter {
    fn format_date_key(&self, date: NaiveDate) -> String;
}

impl<F> DateKeyFormatter for F
where
    F: Fn(NaiveDate) -> String,
{
    fn format_date_key(&self, date: NaiveDate) -> String {
        self(date)
    }
}

/// Short date formatting for a handful of locales.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleDateFormat {
    locale: String,
}

impl LocaleDateFormat {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn pattern(&self) -> &'static str {
        match self.locale.as_str() {
            "en-US" => "%b %-d, %Y",
            "en-GB" | "en-AU" | "en-NZ" | "en-IE" => "%-d %b %Y",
            "de-DE" | "nb-NO" | "da-DK" | "fi-FI" => "%d.%m.%Y",
            "fr-FR" | "es-ES" | "it-IT" | "pt-BR" => "%d/%m/%Y",
            _ => "%Y-%m-%d",
        }
    }
}

impl Default for LocaleDateFormat {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl DateKeyFormatter for LocaleDateFormat {
    fn format_date_key(&self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }
}
