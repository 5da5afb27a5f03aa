use std::fmt;

/// The two tracked instruments, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Nasdaq100,
    Gold,
}

impl Instrument {
    pub const ALL: [Instrument; 2] = [Instrument::Nasdaq100, Instrument::Gold];

    /// Symbol understood by the provider's markets endpoint.
    pub fn symbol(self) -> &'static str {
        match self {
            Instrument::Nasdaq100 => "NDX:IND",
            Instrument::Gold => "XAUUSD:CUR",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Instrument::Nasdaq100 => "Nasdaq 100",
            Instrument::Gold => "Gold (XAUUSD)",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Instrument::Nasdaq100 => "🖥",
            Instrument::Gold => "🥇",
        }
    }

    /// Whether the economic calendar feeds this instrument's score.
    pub fn uses_macro_calendar(self) -> bool {
        matches!(self, Instrument::Nasdaq100)
    }

    /// Whether dollar, yield and volatility moves feed this instrument's score.
    pub fn uses_cross_market(self) -> bool {
        matches!(self, Instrument::Gold)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.symbol())
    }
}
