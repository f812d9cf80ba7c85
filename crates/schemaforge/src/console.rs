//! Colorful console output for compile events.
//!
//! Provides a `tracing` layer that formats the compiler's `compile_start`,
//! `compile_end` and `compile_failed` events with colors. Other events go
//! through the regular filter untouched.

use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_DIRECTIVE: &str = "schemaforge_compiler=info";

/// Initializes console output.
///
/// Safe to call multiple times; only the first call has effect. `RUST_LOG`
/// directives are honoured on top of `schemaforge_compiler=info`.
pub fn init() {
    INIT.get_or_init(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = DEFAULT_DIRECTIVE.parse() {
            filter = filter.add_directive(directive);
        }

        // Another subscriber may already be installed by the host program.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(CompileConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats compile events with colors.
pub struct CompileConsoleLayer;

impl<S: Subscriber> Layer<S> for CompileConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("schemaforge_compiler") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        if let Some(output) = format_compile_event(&visitor) {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    collection: Option<String>,
    error: Option<String>,
    fingerprint: Option<String>,
    max_depth: Option<u64>,
    property_count: Option<u64>,
    key_count: Option<u64>,
    index_count: Option<u64>,
    duration_us: Option<u64>,
}

impl EventVisitor {
    fn record_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "event" => self.event = Some(value),
            "collection" => self.collection = Some(value),
            "error" => self.error = Some(value),
            "fingerprint" => self.fingerprint = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.record_text(field, s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "max_depth" => self.max_depth = Some(value),
            "property_count" => self.property_count = Some(value),
            "key_count" => self.key_count = Some(value),
            "index_count" => self.index_count = Some(value),
            "duration_us" => self.duration_us = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }
}

fn format_compile_event(v: &EventVisitor) -> Option<String> {
    let collection = v.collection.as_deref().unwrap_or("?");
    let line = match v.event.as_deref()? {
        "compile_start" => format!(
            "{} {} {} compiling {} (max depth {})",
            timestamp().bright_black(),
            "INFO".bright_green(),
            "[Compiler]".bright_cyan(),
            collection.white().bold(),
            v.max_depth.unwrap_or(0).to_string().yellow(),
        ),
        "compile_end" => format!(
            "{} {} {} compiled {}: {} properties, {} keys, {} indexes, id {} in {}",
            timestamp().bright_black(),
            "INFO".bright_green(),
            "[Compiler]".bright_cyan(),
            collection.white().bold(),
            v.property_count.unwrap_or(0).to_string().bright_yellow(),
            v.key_count.unwrap_or(0).to_string().bright_yellow(),
            v.index_count.unwrap_or(0).to_string().bright_yellow(),
            v.fingerprint.as_deref().unwrap_or("-").bright_magenta(),
            format_duration_us(v.duration_us.unwrap_or(0)).yellow(),
        ),
        "compile_failed" => format!(
            "{} {} {} {} rejected: {}",
            timestamp().bright_black(),
            "WARN".bright_red(),
            "[Compiler]".bright_cyan(),
            collection.white().bold(),
            v.error.as_deref().unwrap_or("unknown error").bright_red(),
        ),
        _ => return None,
    };
    Some(line)
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_us(us: u64) -> String {
    if us < 1000 {
        format!("{}us", us)
    } else if us < 1_000_000 {
        format!("{:.2}ms", us as f64 / 1000.0)
    } else {
        format!("{:.2}s", us as f64 / 1_000_000.0)
    }
}
