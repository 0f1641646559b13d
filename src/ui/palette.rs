use ratatui::style::Color;

/// Colors used by the feed screen.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    /// Canvas background.
    pub base: Color,
    /// Header and status bar background.
    pub mantle: Color,
    /// Borders and separators.
    pub overlay1: Color,
    /// Primary text.
    pub text: Color,
    /// Secondary text such as descriptions.
    pub subtext0: Color,
    /// Active tab and handles.
    pub sapphire: Color,
    /// Ultra-top badge.
    pub mauve: Color,
    /// Idle status.
    pub green: Color,
    /// Top badge and loading status.
    pub yellow: Color,
    /// Errors.
    pub red: Color,
}

/// Default dark palette.
pub const PALETTE: Palette = Palette {
    base: Color::Rgb(30, 30, 46),        // #1e1e2e
    mantle: Color::Rgb(24, 24, 37),      // #181825
    overlay1: Color::Rgb(127, 132, 156), // #7f849c
    text: Color::Rgb(205, 214, 244),     // #cdd6f4
    subtext0: Color::Rgb(166, 173, 200), // #a6adc8
    sapphire: Color::Rgb(116, 199, 236), // #74c7ec
    mauve: Color::Rgb(203, 166, 247),    // #cba6f7
    green: Color::Rgb(166, 227, 161),    // #a6e3a1
    yellow: Color::Rgb(249, 226, 175),   // #f9e2af
    red: Color::Rgb(243, 139, 168),      // #f38ba8
};
