pub mod items_dto;
