pub mod access_code;
