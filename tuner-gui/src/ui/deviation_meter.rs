//! # Deviation Meter Widget
//!
//! Horizontal meter showing how far the stabilized frequency sits from the
//! matched string's target, scaled to the tuning band. The needle takes
//! the verdict's colour.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, mouse};

/// Deviation meter widget.
pub struct DeviationMeter {
    /// Offset from the target in Hz and the needle colour, if a string is matched
    needle: Option<(f32, Color)>,
    /// Offset shown at either end of the meter, in Hz
    range: f32,
}

impl DeviationMeter {
    pub fn new(needle: Option<(f32, Color)>, range: f32) -> Self {
        Self {
            needle,
            range: range.max(f32::EPSILON),
        }
    }

    pub fn view<'a>(self) -> Element<'a, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(60.0)),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for DeviationMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Draw meter background
        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        // Draw center line (the target)
        let center_x = bounds.width / 2.0;
        let center_line = Path::line(
            Point::new(center_x, 0.0),
            Point::new(center_x, bounds.height),
        );
        frame.stroke(
            &center_line,
            Stroke::default().with_width(2.0).with_color(Color::WHITE),
        );

        // Draw needle
        if let Some((offset, color)) = self.needle {
            let clamped = offset.clamp(-self.range, self.range);
            let needle_pos = (clamped + self.range) / (2.0 * self.range) * bounds.width;
            let needle =
                Path::rectangle(Point::new(needle_pos - 2.0, 0.0), Size::new(4.0, bounds.height));
            frame.fill(&needle, color);
        }

        vec![frame.into_geometry()]
    }
}
