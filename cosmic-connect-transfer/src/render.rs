//! Chat log markup for a transfer
//!
//! Every transfer renders as a one-row table: an optional thumbnail cell, a
//! text cell tinted by state, and a button cell holding two stacked images.
//! Active transfers get clickable controls, finished and cancelled ones get
//! blank tinted caps.

use crate::controls::{ClickTarget, ControlButton};
use crate::glyphs::ButtonGlyph;
use crate::preview::Thumbnail;
use crate::transfer::{TransferDirection, TransferStatus};
use crate::WidgetId;
use tracing::warn;

/// Colour class applied to the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    /// Pending, running or paused
    Silver,
    /// Cancelled
    Red,
    /// Finished
    Green,
}

impl Tint {
    pub fn for_status(status: TransferStatus) -> Self {
        match status {
            TransferStatus::Canceled => Tint::Red,
            TransferStatus::Finished => Tint::Green,
            _ => Tint::Silver,
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Tint::Silver => "silver",
            Tint::Red => "red",
            Tint::Green => "green",
        }
    }
}

/// Read-only snapshot of a widget, borrowed for one render
#[derive(Debug, Clone, Copy)]
pub struct TransferView<'a> {
    pub widget_id: WidgetId,
    pub direction: TransferDirection,
    pub status: TransferStatus,
    pub remote_paused: bool,
    pub filename: &'a str,
    pub size: &'a str,
    /// Last reported byte count, already formatted
    pub transferred: &'a str,
    pub speed: &'a str,
    pub eta: &'a str,
    pub preview: Option<&'a Thumbnail>,
}

/// Glyph for the right-hand button of an active form
///
/// A remote pause always greys the button out, whatever the local state.
pub fn secondary_glyph(
    status: TransferStatus,
    direction: TransferDirection,
    remote_paused: bool,
) -> ButtonGlyph {
    if remote_paused {
        return ButtonGlyph::PauseDisabled;
    }

    match (status, direction) {
        (TransferStatus::Processing, _) => ButtonGlyph::Pause,
        (TransferStatus::Paused, _) => ButtonGlyph::Resume,
        (_, TransferDirection::Receiving) => ButtonGlyph::Accept,
        (_, TransferDirection::Sending) => ButtonGlyph::PauseDisabled,
    }
}

/// Render the markup fragment for a transfer
pub fn render_transfer(view: &TransferView<'_>) -> String {
    let tint = Tint::for_status(view.status);
    match view.status {
        TransferStatus::Pending | TransferStatus::Processing | TransferStatus::Paused => {
            let secondary = secondary_glyph(view.status, view.direction, view.remote_paused);
            two_button_form(view, tint, ButtonGlyph::Stop, secondary)
        }
        TransferStatus::Canceled => {
            buttonless_form(view, tint, ButtonGlyph::BlankLeftRed, ButtonGlyph::BlankRightRed)
        }
        TransferStatus::Finished => buttonless_form(
            view,
            tint,
            ButtonGlyph::BlankLeftGreen,
            ButtonGlyph::BlankRightGreen,
        ),
    }
}

fn two_button_form(
    view: &TransferView<'_>,
    tint: Tint,
    primary: ButtonGlyph,
    secondary: ButtonGlyph,
) -> String {
    let primary_img = control_img(view.widget_id, ControlButton::Primary, primary);
    let secondary_img = control_img(view.widget_id, ControlButton::Secondary, secondary);

    let content = format!(
        "<p>{}</p><p>{} / {}&nbsp;({} ETA: {})</p>\n",
        escape_html(view.filename),
        view.transferred,
        view.size,
        view.speed,
        view.eta
    );

    wrap_into_form(view, tint, &content, &primary_img, &secondary_img)
}

fn buttonless_form(
    view: &TransferView<'_>,
    tint: Tint,
    left: ButtonGlyph,
    right: ButtonGlyph,
) -> String {
    let content = format!(
        "<p>{}</p><p>{}</p>",
        escape_html(view.filename),
        view.size
    );

    wrap_into_form(
        view,
        tint,
        &content,
        &placeholder_img(left),
        &placeholder_img(right),
    )
}

fn wrap_into_form(
    view: &TransferView<'_>,
    tint: Tint,
    content: &str,
    left_img: &str,
    right_img: &str,
) -> String {
    let mut html = String::new();
    html.push_str("<table width=100% cellspacing=\"0\">\n");
    html.push_str("<tr valign=middle>\n");
    html.push_str(&miniature(view, tint));
    html.push_str("<td width=100%>\n");
    html.push_str(&format!("<div class={}>{}</div>\n", tint.class(), content));
    html.push_str("</td>\n");
    html.push_str("<td>\n");
    html.push_str(&format!(
        "<div class=button>{}<br>{}</div>\n",
        left_img, right_img
    ));
    html.push_str("</td>\n");
    html.push_str("</tr>\n");
    html.push_str("</table>\n");
    html
}

fn miniature(view: &TransferView<'_>, tint: Tint) -> String {
    match view.preview {
        Some(thumbnail) => format!(
            "<td><div class={}>\n<img src=\"data:mini.{}/png;base64,{}\">\n</div></td>\n",
            tint.class(),
            view.widget_id,
            thumbnail.png_base64()
        ),
        None => String::new(),
    }
}

fn control_img(widget_id: WidgetId, button: ControlButton, glyph: ButtonGlyph) -> String {
    let target = ClickTarget::new(widget_id, button);
    glyph_img(&target.code(), glyph)
}

fn placeholder_img(glyph: ButtonGlyph) -> String {
    glyph_img("placeholder", glyph)
}

fn glyph_img(source: &str, glyph: ButtonGlyph) -> String {
    image_tag(source, glyph.png_base64(), glyph.name())
}

/// `<img>` named `data:<source>/png`; without image data only the alt text shows
fn image_tag(source: &str, png_base64: Option<&str>, alt: &str) -> String {
    match png_base64 {
        Some(data) => format!(
            "<img src=\"data:{}/png;base64,{}\" alt=\"{}\">",
            source, data, alt
        ),
        None => {
            warn!("No image data for {} glyph, rendering alt text only", alt);
            format!("<img src=\"data:{}/png\" alt=\"{}\">", source, alt)
        }
    }
}

/// Escape text for embedding in element content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(status: TransferStatus, direction: TransferDirection) -> TransferView<'static> {
        TransferView {
            widget_id: 5,
            direction,
            status,
            remote_paused: false,
            filename: "notes.txt",
            size: "2.00kiB",
            transferred: "1.00kiB",
            speed: "512.00B/s",
            eta: "00:02",
            preview: None,
        }
    }

    #[test]
    fn test_secondary_glyph_selection() {
        use TransferDirection::*;
        use TransferStatus::*;

        assert_eq!(secondary_glyph(Processing, Sending, false), ButtonGlyph::Pause);
        assert_eq!(secondary_glyph(Processing, Receiving, false), ButtonGlyph::Pause);
        assert_eq!(secondary_glyph(Paused, Sending, false), ButtonGlyph::Resume);
        assert_eq!(secondary_glyph(Pending, Receiving, false), ButtonGlyph::Accept);
        assert_eq!(secondary_glyph(Pending, Sending, false), ButtonGlyph::PauseDisabled);
    }

    #[test]
    fn test_remote_pause_overrides_state() {
        use TransferDirection::*;
        use TransferStatus::*;

        for status in [Pending, Processing, Paused] {
            for direction in [Sending, Receiving] {
                assert_eq!(
                    secondary_glyph(status, direction, true),
                    ButtonGlyph::PauseDisabled
                );
            }
        }
    }

    #[test]
    fn test_pending_receive_has_accept_control() {
        let html = render_transfer(&view(TransferStatus::Pending, TransferDirection::Receiving));
        assert!(html.contains("data:ftrans.5.btnA/png;base64,"));
        assert!(html.contains("data:ftrans.5.btnB/png;base64,"));
        assert!(html.contains("alt=\"accept\""));
        assert!(html.contains("alt=\"stop\""));
        assert!(html.contains("<div class=silver>"));
        assert!(html.contains("<p>1.00kiB / 2.00kiB&nbsp;(512.00B/s ETA: 00:02)</p>"));
    }

    #[test]
    fn test_remote_paused_renders_disabled() {
        let mut v = view(TransferStatus::Processing, TransferDirection::Sending);
        v.remote_paused = true;
        let html = render_transfer(&v);
        assert!(html.contains("alt=\"pause-disabled\""));
        assert!(!html.contains("alt=\"pause\""));
    }

    #[test]
    fn test_cancelled_form_is_red_and_buttonless() {
        let html = render_transfer(&view(TransferStatus::Canceled, TransferDirection::Sending));
        assert!(html.contains("<div class=red><p>notes.txt</p><p>2.00kiB</p></div>"));
        assert!(!html.contains("ftrans."));
        assert!(html.contains("alt=\"blank-left-red\""));
        assert!(html.contains("alt=\"blank-right-red\""));
    }

    #[test]
    fn test_finished_form_is_green_with_thumbnail() {
        let image = image::RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        let thumbnail = Thumbnail::from_bytes(bytes.get_ref(), 50).unwrap();

        let mut v = view(TransferStatus::Finished, TransferDirection::Receiving);
        v.preview = Some(&thumbnail);
        let html = render_transfer(&v);

        assert!(html.contains("<div class=green>"));
        assert!(html.contains("data:mini.5/png;base64,"));
        assert!(!html.contains("ftrans."));
    }

    #[test]
    fn test_filename_is_escaped() {
        let mut v = view(TransferStatus::Pending, TransferDirection::Receiving);
        v.filename = "<script>&\"x\".txt";
        let html = render_transfer(&v);
        assert!(html.contains("<p>&lt;script&gt;&amp;&quot;x&quot;.txt</p>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_missing_glyph_data_keeps_alt_and_click_code() {
        let tag = image_tag("ftrans.5.btnA", None, "stop");
        assert_eq!(tag, "<img src=\"data:ftrans.5.btnA/png\" alt=\"stop\">");
        assert!(!tag.contains("base64,"));

        let tag = image_tag("ftrans.5.btnA", Some("AAAA"), "stop");
        assert_eq!(
            tag,
            "<img src=\"data:ftrans.5.btnA/png;base64,AAAA\" alt=\"stop\">"
        );
    }

    #[test]
    fn test_tint_classes() {
        assert_eq!(Tint::for_status(TransferStatus::Pending).class(), "silver");
        assert_eq!(Tint::for_status(TransferStatus::Paused).class(), "silver");
        assert_eq!(Tint::for_status(TransferStatus::Canceled).class(), "red");
        assert_eq!(Tint::for_status(TransferStatus::Finished).class(), "green");
    }
}
