pub mod recorder;
pub(crate) mod shared;
pub(crate) mod worker;

#[cfg(test)]
pub(crate) mod testing;
