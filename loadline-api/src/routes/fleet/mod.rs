/// Fleet CRUD: carriers, drivers, vehicles
///
/// Reads require membership in the effective tenant; writes require the
/// dispatcher role or better.

pub mod carriers;
pub mod drivers;
pub mod vehicles;
