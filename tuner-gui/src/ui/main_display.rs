//! # Main Display Module
//!
//! Layout of the tuner window: instrument picker, frequency readout,
//! coloured verdict, deviation meter and the restart button.

use iced::widget::{Space, button, column, container, pick_list, row, text};
use iced::{Alignment, Color, Element, Length};
use tuner_core::tuning::{ColorCue, format_frequency};

use super::deviation_meter::DeviationMeter;
use crate::{AppDisplayData, CaptureStatus, InstrumentChoice, Message};

/// Converts the core colour cue into an Iced colour.
pub fn cue_color(cue: ColorCue) -> Color {
    let (r, g, b) = cue.rgb();
    Color::from_rgb8(r, g, b)
}

/// Creates the complete main application view
pub fn create_main_view<'a>(
    data: &'a AppDisplayData,
    choices: &'a [InstrumentChoice],
    selected: &'a InstrumentChoice,
) -> Element<'a, Message> {
    let title = text("String Tuner").size(36);

    let picker = row![
        text("Select an instrument:").size(16),
        Space::with_width(10),
        pick_list(choices, Some(selected.clone()), Message::InstrumentSelected).width(Length::Fixed(160.0)),
    ]
    .align_y(Alignment::Center);

    let readout = text(format!("Detected frequency: {}", format_frequency(data.frequency))).size(22);

    let verdict: Element<'a, Message> = match &data.verdict {
        Some(verdict) => text(verdict.message())
            .size(24)
            .color(cue_color(verdict.cue()))
            .into(),
        None => Space::with_height(24).into(),
    };

    let meter = DeviationMeter::new(
        data.verdict.as_ref().and_then(|v| {
            v.target_frequency
                .map(|target| (v.display_frequency - target, cue_color(v.cue())))
        }),
        data.band_epsilon,
    )
    .view();

    let cents = match data.verdict.as_ref().and_then(|v| v.cents()) {
        Some(cents) => text(format!("{:+.1} cents", cents)).size(16),
        None => text("").size(16),
    };

    let status = match &data.capture {
        CaptureStatus::Starting => text("Opening microphone...").size(14),
        CaptureStatus::Running { sample_rate } => text(format!("Listening at {} Hz", sample_rate)).size(14),
        CaptureStatus::Unavailable(reason) => text(format!("Microphone unavailable: {}", reason))
            .size(14)
            .color(cue_color(ColorCue::Red)),
    };

    let restart = button(text("Restart microphone").size(16))
        .padding([8, 16])
        .on_press(Message::RestartCapture);

    let content = column![
        title,
        Space::with_height(10),
        picker,
        readout,
        verdict,
        meter,
        cents,
        Space::with_height(10),
        restart,
        status,
    ]
    .spacing(12)
    .align_x(Alignment::Center)
    .padding(30)
    .max_width(560);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}
