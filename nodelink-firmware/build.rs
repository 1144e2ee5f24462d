//! Build script for nodelink-firmware
//!
//! - Sets up linker search paths and scripts for memory.x
//! - Validates node.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// GPIOs wired to the board's UART0, I2C0 and battery tap
const BOARD_PINS: [i64; 5] = [0, 1, 8, 9, 26];

/// Known keys per section
const SECTIONS: &[(&str, &[&str])] = &[
    (
        "modem",
        &[
            "model",
            "power_key_pin",
            "reset_pin",
            "disable_pin",
            "supply_enable_pin",
            "boot_timeout_ms",
            "command_timeout_ms",
        ],
    ),
    ("link", &["baudrate", "poll_interval_ms"]),
    ("battery", &["vref_mv", "divider"]),
    ("report", &["interval_s", "format"]),
    ("server", &["host", "port", "context_id", "connect_id"]),
];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml configuration at compile time
fn validate_config() {
    // Re-run if node.toml changes
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    // Check if config file exists
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a node.toml configuration file.           ║\n\
            ║  Please create one in the nodelink-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    // Read the config file
    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    report("Unknown sections or keys in node.toml", validate_layout(&config));
    report("Invalid [modem] configuration", validate_modem(&config));
    report("Invalid [link] configuration", validate_link(&config));
    report("Invalid [battery] configuration", validate_battery(&config));
    report("Invalid [report] configuration", validate_report(&config));
    report("Invalid [server] configuration", validate_server(&config));

    println!("cargo:warning=node.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build with a boxed list of errors
fn report(title: &str, errors: Vec<String>) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Reject sections and keys the firmware does not know
///
/// The on-target parser ignores unknown keys, so a typo would otherwise
/// silently fall back to a default.
fn validate_layout(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    let root = match config.as_table() {
        Some(t) => t,
        None => return errors,
    };

    for (section, value) in root {
        let keys = match SECTIONS.iter().find(|(name, _)| name == section) {
            Some((_, keys)) => keys,
            None => {
                errors.push(format!("unknown section [{}]", section));
                continue;
            }
        };
        let table = match value.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("[{}] must be a table", section));
                continue;
            }
        };
        for key in table.keys() {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", section, key));
            }
        }
    }
    errors
}

fn section<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::value::Table> {
    config.get(name).and_then(|v| v.as_table())
}

/// Check an integer key is within `min..=max` if present
fn check_range(
    errors: &mut Vec<String>,
    table: &toml::value::Table,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
) {
    match table.get(key) {
        Some(toml::Value::Integer(v)) if *v < min || *v > max => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
        }
        Some(toml::Value::Integer(_)) | None => {}
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

/// Parse a "gpioN" / "!gpioN" pin string
fn parse_pin(value: &str) -> Option<i64> {
    let value = value.strip_prefix('!').unwrap_or(value);
    let pin: i64 = value.strip_prefix("gpio")?.parse().ok()?;
    (0..=29).contains(&pin).then_some(pin)
}

fn validate_modem(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    let modem = match section(config, "modem") {
        Some(t) => t,
        None => return errors,
    };

    if let Some(model) = modem.get("model") {
        match model.as_str() {
            Some(s) if s.len() <= 16 => {}
            Some(_) => errors.push("[modem] model must be at most 16 characters".to_string()),
            None => errors.push("[modem] model must be a string".to_string()),
        }
    }

    let mut used: Vec<(i64, &str)> = Vec::new();
    for key in ["power_key_pin", "reset_pin", "disable_pin", "supply_enable_pin"] {
        let value = match modem.get(key) {
            Some(v) => v,
            None => continue,
        };
        let pin = match value.as_str().and_then(parse_pin) {
            Some(pin) => pin,
            None => {
                errors.push(format!("[modem] {} must be \"gpio0\"-\"gpio29\"", key));
                continue;
            }
        };
        if BOARD_PINS.contains(&pin) {
            errors.push(format!("[modem] {} uses board pin gpio{}", key, pin));
        }
        if let Some((_, other)) = used.iter().find(|(p, _)| *p == pin) {
            errors.push(format!("[modem] {} and {} share gpio{}", other, key, pin));
        }
        used.push((pin, key));
    }

    check_range(&mut errors, modem, "modem", "boot_timeout_ms", 1, 120_000);
    check_range(&mut errors, modem, "modem", "command_timeout_ms", 1, 120_000);
    errors
}

fn validate_link(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    if let Some(link) = section(config, "link") {
        check_range(&mut errors, link, "link", "baudrate", 1_200, 921_600);
        check_range(&mut errors, link, "link", "poll_interval_ms", 1, 1_000);
    }
    errors
}

fn validate_battery(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    let battery = match section(config, "battery") {
        Some(t) => t,
        None => return errors,
    };

    check_range(&mut errors, battery, "battery", "vref_mv", 1, 5_000);
    if let Some(divider) = battery.get("divider") {
        let valid = divider
            .as_str()
            .and_then(|s| s.split_once(':'))
            .map(|(n, d)| (n.trim().parse::<u16>(), d.trim().parse::<u16>()))
            .is_some_and(|r| matches!(r, (Ok(n), Ok(d)) if n > 0 && d > 0));
        if !valid {
            errors.push("[battery] divider must look like \"2:1\"".to_string());
        }
    }
    errors
}

fn validate_report(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    let report = match section(config, "report") {
        Some(t) => t,
        None => return errors,
    };

    check_range(&mut errors, report, "report", "interval_s", 1, 86_400);
    if let Some(format) = report.get("format") {
        if !matches!(format.as_str(), Some("text") | Some("postcard")) {
            errors.push("[report] format must be 'text' or 'postcard'".to_string());
        }
    }
    errors
}

fn validate_server(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    let server = match section(config, "server") {
        Some(t) => t,
        None => return errors,
    };

    if let Some(host) = server.get("host") {
        match host.as_str() {
            Some(s) if s.len() <= 64 => {}
            Some(_) => errors.push("[server] host must be at most 64 characters".to_string()),
            None => errors.push("[server] host must be a string".to_string()),
        }
    }
    check_range(&mut errors, server, "server", "port", 1, 65_535);
    check_range(&mut errors, server, "server", "context_id", 1, 16);
    check_range(&mut errors, server, "server", "connect_id", 0, 11);
    errors
}
