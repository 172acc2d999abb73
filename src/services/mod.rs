pub mod handgrading;
pub mod mutant_hints;

pub use handgrading::HandgradingService;
pub use mutant_hints::HintService;
