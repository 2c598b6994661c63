pub mod organizer_writer;
pub mod user_id_reader;
