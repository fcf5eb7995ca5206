fn main() {
    metered_chat::run()
}
