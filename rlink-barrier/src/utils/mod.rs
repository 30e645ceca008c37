pub mod date_time;
pub mod logger;
pub mod thread;

pub fn parse_arg_with(arg_key: &str, default_value: &str) -> String {
    parse_arg(arg_key).unwrap_or_else(|_| default_value.to_string())
}

/// Find a `key=value` command line argument
pub fn parse_arg(arg_key: &str) -> anyhow::Result<String> {
    let args: Vec<String> = std::env::args().collect();
    find_arg(args.as_slice(), arg_key)
}

fn find_arg(args: &[String], arg_key: &str) -> anyhow::Result<String> {
    for arg in args {
        let tokens: Vec<&str> = arg.splitn(2, '=').collect();
        if tokens.len() != 2 {
            continue;
        }

        if tokens[0].eq(arg_key) {
            return Ok(tokens[1].to_string());
        }
    }

    Err(anyhow!("`{}` argument is not found", arg_key))
}
