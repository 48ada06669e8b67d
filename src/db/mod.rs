pub mod pgstore;
