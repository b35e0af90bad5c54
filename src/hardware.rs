pub mod ad4080;
