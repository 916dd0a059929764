pub mod enum_def;
