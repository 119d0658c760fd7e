mod hub_config_tests;
