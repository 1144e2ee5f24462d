//! Simple TOML parser for node configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! `node.toml`. It does NOT support the full TOML grammar and needs no
//! allocator.
//!
//! Supported features:
//! - Key = value pairs (string, integer)
//! - [section] headers
//! - Comments (# ...), including after a value
//!
//! Unknown keys are ignored so older firmware accepts newer files; the
//! build script rejects them at compile time.

use heapless::String;
use nodelink_protocol::PayloadFormat;

use super::types::{
    BatteryConfig, LinkConfig, ModemConfig, NodeConfig, PinConfig, ReportConfig, ServerConfig,
};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// String longer than its field allows
    TooLong,
    /// Invalid pin string
    InvalidPin,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Modem,
    Link,
    Battery,
    Report,
    Server,
}

/// Parse TOML configuration into NodeConfig
///
/// Keys absent from the input keep their defaults.
pub fn parse_config(input: &str) -> Result<NodeConfig, ParseError> {
    let mut config = NodeConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            match section {
                Section::Root => {}
                Section::Modem => apply_modem(&mut config.modem, key, value)?,
                Section::Link => apply_link(&mut config.link, key, value)?,
                Section::Battery => apply_battery(&mut config.battery, key, value)?,
                Section::Report => apply_report(&mut config.report, key, value)?,
                Section::Server => apply_server(&mut config.server, key, value)?,
            }
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "modem" => Ok(Section::Modem),
        "link" => Ok(Section::Link),
        "battery" => Ok(Section::Battery),
        "report" => Ok(Section::Report),
        "server" => Ok(Section::Server),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_modem(modem: &mut ModemConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "model" => modem.model = parse_bounded(value)?,
        "power_key_pin" => modem.power_key_pin = parse_pin(value)?,
        "reset_pin" => modem.reset_pin = parse_pin(value)?,
        "disable_pin" => modem.disable_pin = parse_pin(value)?,
        "supply_enable_pin" => modem.supply_enable_pin = parse_pin(value)?,
        "boot_timeout_ms" => modem.boot_timeout_ms = parse_int(value)?,
        "command_timeout_ms" => modem.command_timeout_ms = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

fn apply_link(link: &mut LinkConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "baudrate" => link.baudrate = parse_int(value)?,
        "poll_interval_ms" => {
            link.poll_interval_ms = parse_int(value)?;
            if link.poll_interval_ms == 0 {
                return Err(ParseError::InvalidValue);
            }
        }
        _ => {}
    }
    Ok(())
}

fn apply_battery(battery: &mut BatteryConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "vref_mv" => battery.vref_mv = parse_int(value)?,
        "divider" => {
            let (num, den) = parse_ratio(value)?;
            battery.divider_num = num;
            battery.divider_den = den;
        }
        _ => {}
    }
    Ok(())
}

fn apply_report(report: &mut ReportConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "interval_s" => {
            report.interval_s = parse_int(value)?;
            if report.interval_s == 0 {
                return Err(ParseError::InvalidValue);
            }
        }
        "format" => report.format = parse_format(value)?,
        _ => {}
    }
    Ok(())
}

fn apply_server(server: &mut ServerConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "host" => server.host = parse_bounded(value)?,
        "port" => server.port = parse_int(value)?,
        "context_id" => server.context_id = parse_int(value)?,
        "connect_id" => server.connect_id = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

fn parse_bounded<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    let mut out = String::new();
    out.push_str(parse_string(value))
        .map_err(|_| ParseError::TooLong)?;
    Ok(out)
}

/// Parse an integer value, allowing `_` separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits: String<24> = String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a pin string like "gpio11" or "!gpio12"
fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let value = parse_string(value);
    let (inverted, s) = match value.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let num = s.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    let pin: u8 = num.parse().map_err(|_| ParseError::InvalidPin)?;
    if pin > 29 {
        return Err(ParseError::InvalidPin);
    }
    Ok(PinConfig { pin, inverted })
}

/// Parse a divider ratio like "2:1"
fn parse_ratio(value: &str) -> Result<(u16, u16), ParseError> {
    let value = parse_string(value);
    let (num, den) = value.split_once(':').ok_or(ParseError::InvalidValue)?;
    let num: u16 = num.trim().parse().map_err(|_| ParseError::InvalidValue)?;
    let den: u16 = den.trim().parse().map_err(|_| ParseError::InvalidValue)?;
    if num == 0 || den == 0 {
        return Err(ParseError::InvalidValue);
    }
    Ok((num, den))
}

fn parse_format(value: &str) -> Result<PayloadFormat, ParseError> {
    match parse_string(value) {
        "text" => Ok(PayloadFormat::Text),
        "postcard" => Ok(PayloadFormat::Postcard),
        _ => Err(ParseError::InvalidValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("gpio11").unwrap();
        assert_eq!(pin.pin, 11);
        assert!(!pin.inverted);

        let pin = parse_pin("\"!gpio12\"").unwrap();
        assert_eq!(pin.pin, 12);
        assert!(pin.inverted);

        assert_eq!(parse_pin("pin3"), Err(ParseError::InvalidPin));
        assert_eq!(parse_pin("gpio30"), Err(ParseError::InvalidPin));
    }

    #[test]
    fn test_parse_int_separators() {
        assert_eq!(parse_int::<u32>("115_200"), Ok(115_200));
        assert_eq!(parse_int::<u16>("70000"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_parse_ratio() {
        assert_eq!(parse_ratio("\"3:2\""), Ok((3, 2)));
        assert_eq!(parse_ratio("2"), Err(ParseError::InvalidValue));
        assert_eq!(parse_ratio("1:0"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), NodeConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let input = r#"
# Reference board
[modem]
model = "BG96"
power_key_pin = "gpio6"
reset_pin = "!gpio7"
boot_timeout_ms = 12_000

[link]
baudrate = 115200
poll_interval_ms = 20   # slower polling

[battery]
divider = "3:1"

[report]
interval_s = 60
format = "postcard"

[server]
host = "telemetry.example.org"
port = 7000
"#;

        let config = parse_config(input).unwrap();
        assert_eq!(config.modem.model.as_str(), "BG96");
        assert_eq!(config.modem.power_key_pin, PinConfig::new(6));
        assert_eq!(config.modem.reset_pin, PinConfig::inverted(7));
        assert_eq!(config.modem.boot_timeout_ms, 12_000);
        // Untouched keys keep their defaults
        assert_eq!(config.modem.disable_pin, ModemConfig::default().disable_pin);
        assert_eq!(config.link.poll_interval_ms, 20);
        assert_eq!(config.battery.vref_mv, 3300);
        assert_eq!((config.battery.divider_num, config.battery.divider_den), (3, 1));
        assert_eq!(config.report.interval_s, 60);
        assert_eq!(config.report.format, PayloadFormat::Postcard);
        assert_eq!(config.server.host.as_str(), "telemetry.example.org");
        assert_eq!(config.server.port, 7000);
        assert!(config.server.is_configured());
    }

    #[test]
    fn test_hash_inside_string_kept() {
        let config = parse_config("[server]\nhost = \"a#b\"\n").unwrap();
        assert_eq!(config.server.host.as_str(), "a#b");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(parse_config("[printer]\n"), Err(ParseError::InvalidSection));
        assert_eq!(
            parse_config("[report]\ninterval_s = 0\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[report]\nformat = \"json\"\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[modem]\nmodel = \"a-very-long-model-name\"\n"),
            Err(ParseError::TooLong)
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = parse_config("[link]\nflow_control = true\n").unwrap();
        assert_eq!(config.link, LinkConfig::default());
    }
}
