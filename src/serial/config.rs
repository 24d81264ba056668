//! Line settings for a serial device.
//!
//! Values are carried as the plain integers the native open call understands
//! and are never coerced here; an unsupported combination is reported by the
//! open itself.

use std::fmt;

/// serial port baud rate
pub const COMMON_BAUD_RATES: &[u32] = &[
    4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 500000, 576000, 921600, 1000000,
    1500000, 2000000,
];

/// no parity bit
pub const PARITY_NONE: u8 = 0;
/// odd parity
pub const PARITY_ODD: u8 = 1;
/// even parity
pub const PARITY_EVEN: u8 = 2;

/// no flow control
pub const FLOW_NONE: u8 = 0;
/// RTS/CTS
pub const FLOW_HARDWARE: u8 = 1;
/// XON/XOFF
pub const FLOW_SOFTWARE: u8 = 2;

/// serial line settings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineConfig {
    pub baud_rate: u32,
    pub stop_bits: u8,
    pub data_bits: u8,
    pub parity: u8,
    pub flow_control: u8,
    /// Extra `open(2)` flags, OR-ed with `O_RDWR`.
    pub flags: i32,
}

impl LineConfig {
    /// line settings with every field given explicitly
    pub const fn new(
        baud_rate: u32,
        stop_bits: u8,
        data_bits: u8,
        parity: u8,
        flow_control: u8,
        flags: i32,
    ) -> Self {
        LineConfig {
            baud_rate,
            stop_bits,
            data_bits,
            parity,
            flow_control,
            flags,
        }
    }

    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub const fn with_stop_bits(mut self, stop_bits: u8) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    pub const fn with_data_bits(mut self, data_bits: u8) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub const fn with_parity(mut self, parity: u8) -> Self {
        self.parity = parity;
        self
    }

    pub const fn with_flow_control(mut self, flow_control: u8) -> Self {
        self.flow_control = flow_control;
        self
    }

    pub const fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }

    /// get parity name
    pub fn parity_name(&self) -> &'static str {
        match self.parity {
            PARITY_NONE => "None",
            PARITY_ODD => "Odd",
            PARITY_EVEN => "Even",
            _ => "Unknown",
        }
    }

    /// get flow control name
    pub fn flow_control_name(&self) -> &'static str {
        match self.flow_control {
            FLOW_NONE => "None",
            FLOW_HARDWARE => "Hardware",
            FLOW_SOFTWARE => "Software",
            _ => "Unknown",
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        LineConfig::new(115200, 1, 8, PARITY_NONE, FLOW_NONE, 0)
    }
}

/// Short form such as `9600 8N1`.
impl fmt::Display for LineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            PARITY_NONE => 'N',
            PARITY_ODD => 'O',
            PARITY_EVEN => 'E',
            _ => '?',
        };
        write!(
            f,
            "{} {}{}{}",
            self.baud_rate, self.data_bits, parity, self.stop_bits
        )?;
        if self.flow_control != FLOW_NONE {
            write!(f, " flow={}", self.flow_control_name())?;
        }
        if self.flags != 0 {
            write!(f, " flags={:#o}", self.flags)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_115200_8n1() {
        let config = LineConfig::default();
        assert_eq!(config, LineConfig::new(115200, 1, 8, 0, 0, 0));
        assert_eq!(config.to_string(), "115200 8N1");
    }

    #[test]
    fn test_setters_keep_values_verbatim() {
        let config = LineConfig::default()
            .with_baud_rate(9600)
            .with_stop_bits(2)
            .with_data_bits(7)
            .with_parity(PARITY_EVEN)
            .with_flow_control(FLOW_HARDWARE)
            .with_flags(0o4000);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.stop_bits, 2);
        assert_eq!(config.data_bits, 7);
        assert_eq!(config.parity, PARITY_EVEN);
        assert_eq!(config.flow_control, FLOW_HARDWARE);
        assert_eq!(config.flags, 0o4000);
        assert_eq!(config.to_string(), "9600 7E2 flow=Hardware flags=0o4000");
    }

    #[test]
    fn test_unknown_values_are_not_coerced() {
        let config = LineConfig::default().with_parity(9).with_flow_control(7);
        assert_eq!(config.parity, 9);
        assert_eq!(config.parity_name(), "Unknown");
        assert_eq!(config.flow_control_name(), "Unknown");
        assert!(config.to_string().contains("8?1"));
    }

    #[test]
    fn test_common_baud_rates_sorted() {
        assert!(COMMON_BAUD_RATES.windows(2).all(|w| w[0] < w[1]));
        assert!(COMMON_BAUD_RATES.contains(&9600));
    }
}
