fn main() -> anyhow::Result<()> {
    course_backends::run()
}
