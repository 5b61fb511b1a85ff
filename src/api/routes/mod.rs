pub mod artist_info;
pub mod health;
pub mod now_playing;
