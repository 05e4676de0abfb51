pub mod asf;
pub mod format;
pub mod layout;
pub mod metadata;
pub mod tags;

#[cfg(test)]
pub(crate) mod fixtures;
