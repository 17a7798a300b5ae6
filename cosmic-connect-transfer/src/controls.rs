//! Click routing between the rendered chat log and the widgets
//!
//! Button images are named `ftrans.<widget id>.btnA` (left) and
//! `ftrans.<widget id>.btnB` (right). The host view hands the clicked name
//! back as a string; it is decoded once into a [`ClickTarget`] here and only
//! the typed value travels further.

use crate::{Result, TransferError, WidgetId};
use std::fmt;
use std::str::FromStr;

const BUTTON_NAMESPACE: &str = "ftrans";

/// One of the two control slots of a transfer form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlButton {
    /// Left slot: cancel a send, reject or cancel a receive
    Primary,
    /// Right slot: pause/resume, or accept a pending receive
    Secondary,
}

impl ControlButton {
    pub fn code(&self) -> &'static str {
        match self {
            ControlButton::Primary => "btnA",
            ControlButton::Secondary => "btnB",
        }
    }
}

impl FromStr for ControlButton {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "btnA" => Ok(ControlButton::Primary),
            "btnB" => Ok(ControlButton::Secondary),
            other => Err(TransferError::InvalidClickCode(other.to_string())),
        }
    }
}

/// Decoded click on a transfer control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClickTarget {
    pub widget_id: WidgetId,
    pub button: ControlButton,
}

impl ClickTarget {
    pub fn new(widget_id: WidgetId, button: ControlButton) -> Self {
        Self { widget_id, button }
    }

    /// Image name embedded in the markup for this control
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClickTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            BUTTON_NAMESPACE,
            self.widget_id,
            self.button.code()
        )
    }
}

impl FromStr for ClickTarget {
    type Err = TransferError;

    /// Accepts the bare name or the full `data:` image source
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TransferError::InvalidClickCode(s.to_string());

        let name = s.trim();
        let name = name.strip_prefix("data:").unwrap_or(name);
        let name = name.split('/').next().unwrap_or(name);

        let mut parts = name.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(BUTTON_NAMESPACE), Some(id), Some(button), None) => {
                let widget_id = id.parse::<WidgetId>().map_err(|_| invalid())?;
                let button = button.parse::<ControlButton>().map_err(|_| invalid())?;
                Ok(Self { widget_id, button })
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_code() {
        let target: ClickTarget = "ftrans.12.btnA".parse().unwrap();
        assert_eq!(target, ClickTarget::new(12, ControlButton::Primary));

        let target: ClickTarget = "ftrans.0.btnB".parse().unwrap();
        assert_eq!(target, ClickTarget::new(0, ControlButton::Secondary));
    }

    #[test]
    fn test_parse_image_source() {
        let target: ClickTarget = "data:ftrans.7.btnB/png;base64,iVBORw0KGgo="
            .parse()
            .unwrap();
        assert_eq!(target, ClickTarget::new(7, ControlButton::Secondary));
    }

    #[test]
    fn test_code_matches_parse() {
        let target = ClickTarget::new(42, ControlButton::Secondary);
        assert_eq!(target.code(), "ftrans.42.btnB");
        assert_eq!(target.code().parse::<ClickTarget>().unwrap(), target);
    }

    #[test]
    fn test_reject_malformed_codes() {
        for code in [
            "",
            "ftrans",
            "ftrans.1",
            "ftrans.x.btnA",
            "ftrans.1.btnC",
            "ftrans.1.btnA.extra",
            "mini.1/png",
            "data:mini.3/png;base64,AAAA",
        ] {
            let err = code.parse::<ClickTarget>().unwrap_err();
            assert!(
                matches!(err, TransferError::InvalidClickCode(ref c) if c == code),
                "{code}"
            );
        }
    }
}
