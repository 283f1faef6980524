pub mod adagrad_rda;
pub mod adam;
pub mod arow;
pub mod nherd;
pub mod pa;
pub mod scw;
pub mod utils;

pub mod classifier_trait;
pub mod factory;

pub use adagrad_rda::AdagradRda;
pub use adam::Adam;
pub use arow::Arow;
pub use classifier_trait::OnlineClassifier;
pub use factory::{build_model, load_model, BinaryModel};
pub use nherd::{DiagonalMode, Nherd};
pub use pa::{PaMode, PassiveAggressive};
pub use scw::{Scw, ScwMode};
