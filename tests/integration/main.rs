mod media;
mod session;
mod transcript;
