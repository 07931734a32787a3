//! Access log lines
//!
//! Each request is written as one line, either in a named layout (`common`,
//! `combined`, `json`) or through a template such as
//! `$remote_addr "$request" $status $http_range`.

use std::borrow::Cow;
use std::time::Duration;

use chrono::{DateTime, Local};

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Line layout, chosen by `logging.access_log_format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLogFormat<'a> {
    Common,
    Combined,
    Json,
    /// Anything else is a template with `$variables`
    Template(&'a str),
}

impl<'a> AccessLogFormat<'a> {
    pub fn parse(name: &'a str) -> Self {
        match name {
            "common" => Self::Common,
            "combined" => Self::Combined,
            "json" => Self::Json,
            template => Self::Template(template),
        }
    }
}

/// What one request did
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub received: DateTime<Local>,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// `1.0`, `1.1`, ...
    pub http_version: String,
    /// Raw Range header
    pub range: Option<String>,
    pub status: u16,
    /// Body length, `None` when the response was streamed without one
    pub body_bytes: Option<u64>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub elapsed: Duration,
}

impl AccessLogEntry {
    /// Start an entry for a request received now
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            received: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            range: None,
            status: 200,
            body_bytes: None,
            referer: None,
            user_agent: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn render(&self, format: AccessLogFormat<'_>) -> String {
        match format {
            AccessLogFormat::Common => self.common(),
            AccessLogFormat::Combined => format!(
                "{} \"{}\" \"{}\"",
                self.common(),
                dash(self.referer.as_deref()),
                dash(self.user_agent.as_deref()),
            ),
            AccessLogFormat::Json => self.json(),
            AccessLogFormat::Template(template) => self.expand(template),
        }
    }

    fn uri(&self) -> Cow<'_, str> {
        match &self.query {
            Some(query) => Cow::Owned(format!("{}?{query}", self.path)),
            None => Cow::Borrowed(&self.path),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.uri(), self.http_version)
    }

    fn body_bytes_text(&self) -> String {
        self.body_bytes.map_or_else(|| "-".to_string(), |n| n.to_string())
    }

    fn common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.received.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes_text(),
        )
    }

    fn json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.received.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "range": self.range,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": u64::try_from(self.elapsed.as_micros()).unwrap_or(u64::MAX),
        })
        .to_string()
    }

    /// Value of a template variable, `None` if the name is unknown
    fn variable(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            "remote_addr" => Cow::Borrowed(self.remote_addr.as_str()),
            "time_local" => Cow::Owned(self.received.format(CLF_TIME).to_string()),
            "time_iso8601" => Cow::Owned(self.received.to_rfc3339()),
            "request" => Cow::Owned(self.request_line()),
            "request_method" => Cow::Borrowed(self.method.as_str()),
            "request_uri" => self.uri(),
            "status" => Cow::Owned(self.status.to_string()),
            "body_bytes_sent" => Cow::Owned(self.body_bytes_text()),
            "http_range" => Cow::Borrowed(dash(self.range.as_deref())),
            "http_referer" => Cow::Borrowed(dash(self.referer.as_deref())),
            "http_user_agent" => Cow::Borrowed(dash(self.user_agent.as_deref())),
            "request_time" => Cow::Owned(format!("{:.3}", self.elapsed.as_secs_f64())),
            _ => return None,
        };
        Some(value)
    }

    /// Replace every `$name` in `template`; unknown names are kept verbatim
    fn expand(&self, template: &str) -> String {
        let mut line = String::with_capacity(template.len() + 64);
        let mut rest = template;
        while let Some(dollar) = rest.find('$') {
            line.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..len];
            match self.variable(name) {
                Some(value) => line.push_str(&value),
                None => {
                    line.push('$');
                    line.push_str(name);
                }
            }
            rest = &after[len..];
        }
        line.push_str(rest);
        line
    }
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
