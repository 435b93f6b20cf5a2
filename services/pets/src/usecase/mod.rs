pub mod pet;
pub mod pet_type;
