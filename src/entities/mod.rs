pub mod cinema;
pub mod movie;
pub mod poster_fetch_attempt;
pub mod screening;
pub mod screening_date;
