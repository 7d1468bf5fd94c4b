mod columns;
mod pipeline;
mod run;
mod sheet;
mod values;

pub use run::run;
