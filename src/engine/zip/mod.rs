pub mod builder;
pub mod manifest;

pub use builder::build_archive;
pub use manifest::nested_path_tree;
