mod interactive;
mod server_info;
