fn main() -> std::process::ExitCode {
    eps_admin_lib::run()
}
