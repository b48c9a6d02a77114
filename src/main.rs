fn main() -> std::io::Result<()> {
    framescribe_lib::run()
}
