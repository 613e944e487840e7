//! Keyboard-driven debug panel for a plane's uniforms.
//!
//! `1`-`4` pick a channel, the arrow keys step it, Shift steps ten at a time.
//! The panel shows its state through [`ControlPanel::title`], which the app
//! puts in the window title.

use winit::keyboard::KeyCode;

use crate::input::Input;
use crate::uniforms::UniformSet;

/// One adjustable value on the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Blur flag, 0 or 1.
    Blur,
    Reveal,
    /// Entry progress.
    Position,
    /// Reveal and entry together.
    Both,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Blur,
        Channel::Reveal,
        Channel::Position,
        Channel::Both,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Channel::Blur => "Blurred",
            Channel::Reveal => "Reveal",
            Channel::Position => "Translate",
            Channel::Both => "Both",
        }
    }

    pub fn step(self) -> f32 {
        match self {
            Channel::Blur => 1.0,
            _ => 0.01,
        }
    }

    fn key(self) -> KeyCode {
        match self {
            Channel::Blur => KeyCode::Digit1,
            Channel::Reveal => KeyCode::Digit2,
            Channel::Position => KeyCode::Digit3,
            Channel::Both => KeyCode::Digit4,
        }
    }

    /// Whether writing this channel takes reveal or entry away from the
    /// timelines. The blur flag has no timeline.
    pub fn claims_timelines(self) -> bool {
        self != Channel::Blur
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Snap to the channel's step grid inside `[0, 1]`.
    pub fn quantize(self, value: f32) -> f32 {
        if !value.is_finite() {
            return 0.0;
        }
        let step = self.step();
        ((value / step).round() * step).clamp(0.0, 1.0)
    }
}

/// A manual change made on the panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelWrite {
    pub channel: Channel,
    pub value: f32,
}

/// Values and selection of the debug panel.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlPanel {
    values: [f32; 4],
    selected: Channel,
    manual: bool,
}

impl ControlPanel {
    pub fn new(blurred: bool) -> Self {
        Self {
            values: [if blurred { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
            selected: Channel::Reveal,
            manual: false,
        }
    }

    pub fn value(&self, channel: Channel) -> f32 {
        self.values[channel.index()]
    }

    pub fn selected(&self) -> Channel {
        self.selected
    }

    pub fn select(&mut self, channel: Channel) {
        self.selected = channel;
    }

    /// True once a value has been changed by hand.
    pub fn is_manual(&self) -> bool {
        self.manual
    }

    /// Translate this frame's key presses into at most one write.
    pub fn handle_input(&mut self, input: &Input) -> Option<PanelWrite> {
        if let Some(channel) = Channel::ALL.into_iter().find(|c| input.key_pressed(c.key())) {
            self.select(channel);
        }

        let up = input.key_pressed(KeyCode::ArrowRight) || input.key_pressed(KeyCode::ArrowUp);
        let down = input.key_pressed(KeyCode::ArrowLeft) || input.key_pressed(KeyCode::ArrowDown);
        let direction = match (up, down) {
            (true, false) => 1,
            (false, true) => -1,
            _ => return None,
        };
        let steps = if input.shift_down() { direction * 10 } else { direction };
        Some(self.nudge(steps))
    }

    /// Move the selected channel by whole steps.
    pub fn nudge(&mut self, steps: i32) -> PanelWrite {
        let channel = self.selected;
        let value = self.value(channel) + steps as f32 * channel.step();
        self.set(channel, value)
    }

    /// Set a channel by hand.
    pub fn set(&mut self, channel: Channel, value: f32) -> PanelWrite {
        let value = channel.quantize(value);
        self.values[channel.index()] = value;
        if channel == Channel::Both {
            self.values[Channel::Reveal.index()] = value;
            self.values[Channel::Position.index()] = value;
        }
        if channel.claims_timelines() {
            if !self.manual {
                tracing::info!(channel = channel.label(), "control panel took over");
            }
            self.manual = true;
        }
        PanelWrite { channel, value }
    }

    /// Follow the running tweens until the first manual write.
    pub fn mirror(&mut self, uniforms: &UniformSet) {
        if self.manual {
            return;
        }
        self.values[Channel::Reveal.index()] = uniforms.reveal();
        self.values[Channel::Position.index()] = uniforms.enter_progress();
    }

    /// Go back to following the tweens, after a replay hands the values back.
    pub fn resume(&mut self) {
        self.manual = false;
    }

    pub fn title(&self) -> String {
        let parts: Vec<String> = Channel::ALL
            .iter()
            .enumerate()
            .map(|(i, &channel)| {
                let marker = if channel == self.selected { ">" } else { " " };
                let value = self.value(channel);
                match channel {
                    Channel::Blur => format!("{marker}{} {}: {value:.0}", i + 1, channel.label()),
                    _ => format!("{marker}{} {}: {value:.2}", i + 1, channel.label()),
                }
            })
            .collect();
        parts.join(" |")
    }
}
