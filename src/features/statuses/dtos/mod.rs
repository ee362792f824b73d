pub mod status_dto;

pub use status_dto::{StatusListDto, StatusResponseDto};
