pub mod descriptor;
pub mod row;
