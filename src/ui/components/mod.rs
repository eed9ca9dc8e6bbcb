//! Small building blocks shared by several pages

pub mod loading;
pub mod notices;
pub mod tabs;
