pub mod memoization;

pub use memoization::ObsoleteStrictMemoizationLint;
