//! Console sink implementation

use crate::core::output_format::format_text_with;
use crate::core::{Entry, LogLevel, OutputFormat, Result, Sink, TimestampFormat};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;

/// Writes one line per entry; Error and Fatal go to stderr, the rest to stdout
pub struct ConsoleSink {
    use_colors: bool,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        }
    }

    /// Colour the level in text output; ignored without the `console` feature
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors && cfg!(feature = "console");
        self
    }

    /// Set the output format for this sink
    ///
    /// # Example
    ///
    /// ```
    /// use telemetry_log::{sinks::ConsoleSink, OutputFormat};
    ///
    /// let sink = ConsoleSink::new().with_output_format(OutputFormat::Json);
    /// ```
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    fn render(&self, entry: &Entry) -> String {
        match self.output_format {
            OutputFormat::Text if self.use_colors => {
                format_text_with(entry, &self.timestamp_format, &self.colored_level(entry.level))
            }
            format => format.format(entry, &self.timestamp_format),
        }
    }

    #[cfg(feature = "console")]
    fn colored_level(&self, level: LogLevel) -> String {
        format!("{:5}", level.to_str())
            .color(level.color_code())
            .to_string()
    }

    #[cfg(not(feature = "console"))]
    fn colored_level(&self, level: LogLevel) -> String {
        format!("{:5}", level.to_str())
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn fire(&self, entry: &Entry) -> Result<()> {
        let output = self.render(entry);

        match entry.level {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
