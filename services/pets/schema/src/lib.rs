pub mod pet_types;
pub mod pets;
