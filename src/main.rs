fn main() {
    radar_gait::cli::run();
}
