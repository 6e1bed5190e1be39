pub mod image_decoder;
pub mod image_file_source;
pub mod image_sequence_source;
